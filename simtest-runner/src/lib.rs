// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for simtest, a harness that finds simulation test benches in a directory
//! tree and runs them one by one.
//!
//! The basic flow is:
//!
//! 1. Load a [`SimtestConfig`](config::SimtestConfig).
//! 2. Find tests with [`TestList::discover`](discovery::TestList::discover), using the config's
//!    [`PathClassifier`](classifier::PathClassifier).
//! 3. Narrow the list down with a [`Selection`](selection::Selection).
//! 4. Run the selection with a [`TestRunner`](runner::TestRunner), feeding events to a
//!    [`TestReporter`](reporter::TestReporter).
//! 5. Exit with the code from the resulting [`RunSummary`](summary::RunSummary).

pub mod classifier;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod reporter;
pub mod runner;
pub mod selection;
mod stopwatch;
pub mod summary;
