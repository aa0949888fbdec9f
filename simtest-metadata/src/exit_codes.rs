// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `simtest`.
///
/// The exit code is the only machine-readable signal a `simtest` run gives to its caller: CI gates
/// on zero versus non-zero. Humans read the printed report for details.
pub enum SimtestExitCode {}

impl SimtestExitCode {
    /// Every selected test passed, or no tests were selected at all.
    pub const OK: i32 = 0;

    /// One or more tests failed.
    pub const TEST_RUN_FAILED: i32 = 1;

    /// The run was aborted before any test started: the configuration could not be read, or the
    /// discovery root does not exist or could not be traversed.
    ///
    /// This shares its value with [`Self::TEST_RUN_FAILED`] so that callers only ever observe `0`
    /// or `1`.
    pub const SETUP_ERROR: i32 = 1;
}
