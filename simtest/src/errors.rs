// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use simtest_metadata::SimtestExitCode;
use simtest_runner::{errors::*, selection::LIST_MODE};
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that simtest expects and reports without a backtrace.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not read current directory")]
    GetCurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: camino::FromPathBufError,
    },
    #[error("current directory has no parent")]
    NoDefaultRoot { current_dir: Utf8PathBuf },
    #[error("--message-format is only supported in list mode")]
    MessageFormatWithoutList { message_format: &'static str },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("test discovery error")]
    DiscoveryError {
        #[from]
        err: DiscoveryError,
    },
    #[error("test runner build error")]
    TestRunnerBuildError {
        #[from]
        err: TestRunnerBuildError,
    },
    #[error("write event error")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
    #[error("test run failed")]
    TestRunFailed,
}

impl ExpectedError {
    pub(crate) fn test_run_failed() -> Self {
        Self::TestRunFailed
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::GetCurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::NoDefaultRoot { .. }
            | Self::MessageFormatWithoutList { .. }
            | Self::ConfigParseError { .. }
            | Self::DiscoveryError { .. }
            | Self::TestRunnerBuildError { .. }
            | Self::WriteEventError { .. } => SimtestExitCode::SETUP_ERROR,
            Self::TestRunFailed => SimtestExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::GetCurrentDirFailed { err } => {
                tracing::error!("could not read current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                tracing::error!("current directory is not valid UTF-8");
                Some(err as &dyn Error)
            }
            Self::NoDefaultRoot { current_dir } => {
                tracing::error!(
                    "current directory `{}` has no parent to search for tests in \
                     (hint: pass in --root)",
                    current_dir.style(styles.bold)
                );
                None
            }
            Self::MessageFormatWithoutList { message_format } => {
                tracing::error!(
                    "--message-format {} is only supported with `{}`",
                    message_format.style(styles.bold),
                    LIST_MODE.style(styles.bold),
                );
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse simtest config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::DiscoveryError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::TestRunnerBuildError { err } => {
                tracing::error!("failed to build test runner");
                Some(err as &dyn Error)
            }
            Self::WriteEventError { err } => {
                tracing::error!("failed to write output");
                Some(err as &dyn Error)
            }
            Self::TestRunFailed => {
                tracing::error!("test run failed");
                None
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
