// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregating test outcomes into a run summary.

use crate::runner::RunOutcome;
use camino::Utf8PathBuf;
use simtest_metadata::SimtestExitCode;

/// Statistics for a completed test run.
///
/// A summary is computed from the full list of outcomes in one pass and never updated afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// The number of tests that were run.
    pub total: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The containing directories of the failed tests, in run order.
    pub failed_dirs: Vec<Utf8PathBuf>,
}

impl RunSummary {
    /// Folds a sequence of outcomes into a summary.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a RunOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut summary, outcome| {
                summary.total += 1;
                if outcome.passed() {
                    summary.passed += 1;
                } else {
                    summary.failed += 1;
                    summary
                        .failed_dirs
                        .push(outcome.entry().containing_dir().to_owned());
                }
                summary
            })
    }

    /// Returns true if no test failed. An empty run is successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Returns the process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            SimtestExitCode::OK
        } else {
            SimtestExitCode::TEST_RUN_FAILED
        }
    }
}
