// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by simtest.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::sync::Arc;
use thiserror::Error;

/// An error that occurred while reading or validating the config.
#[derive(Debug, Error)]
#[error("failed to parse simtest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config or deserializing it.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// A value that must be non-empty was empty.
    #[error("`{key}` must not be empty")]
    EmptyValue {
        /// The dotted key that was empty.
        key: &'static str,
    },

    /// The launcher could not be split into arguments.
    #[error("failed to split launcher `{launcher}` into arguments")]
    InvalidLauncher {
        /// The launcher string.
        launcher: String,

        /// The underlying error.
        #[source]
        err: shell_words::ParseError,
    },
}

/// An error that occurred while discovering tests.
///
/// Only problems with the discovery root itself are errors. Unreadable directories below the root
/// are logged and skipped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The root does not exist or is not a directory.
    #[error("discovery root `{root}` does not exist or is not a directory")]
    RootNotFound {
        /// The discovery root.
        root: Utf8PathBuf,
    },

    /// The root could not be traversed.
    #[error("failed to read discovery root `{root}`")]
    RootUnreadable {
        /// The discovery root.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

/// An error that occurred while executing a single test.
///
/// These errors never abort a run: the test is recorded as failed and the run continues.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ExecuteError {
    /// The working directory could not be changed to the test's directory.
    #[error("failed to change directory to `{dir}`")]
    ChangeDir {
        /// The directory that could not be entered.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: Arc<std::io::Error>,
    },

    /// The launcher could not be started.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// The command line that was attempted.
        command: String,

        /// The underlying error.
        #[source]
        err: Arc<std::io::Error>,
    },

    /// Reading standard output failed partway through the test.
    #[error("error reading standard output")]
    ReadStdout(#[source] Arc<std::io::Error>),

    /// Reading standard error failed partway through the test.
    #[error("error reading standard error")]
    ReadStderr(#[source] Arc<std::io::Error>),

    /// Waiting for the child process to exit failed.
    #[error("error waiting for test process to exit")]
    Wait(#[source] Arc<std::io::Error>),
}

/// An error that occurred while building a [`TestRunner`](crate::runner::TestRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestRunnerBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] std::io::Error),

    /// The success marker could not be compiled into a matcher.
    #[error("error building matcher for success marker `{marker}`")]
    MarkerMatcher {
        /// The success marker.
        marker: String,

        /// The underlying error.
        #[source]
        err: aho_corasick::BuildError,
    },
}

/// An error that occurs while writing an event or a test list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while serializing output to JSON.
    #[error("error serializing to JSON")]
    Json(#[source] serde_json::Error),
}
