// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to simtest's machine-readable output and documented exit codes.
//!
//! `simtest list --message-format json` emits a [`TestListSummary`]. Tools that drive simtest from
//! CI can deserialize it to learn which test benches were discovered without running them.

mod exit_codes;
mod test_list;

pub use exit_codes::*;
pub use test_list::*;
