// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Root-level data for a list of discovered tests.
///
/// This is the output of `simtest list --message-format json`.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TestListSummary {
    /// The directory discovery started from. All test paths are relative to it.
    pub root: Utf8PathBuf,

    /// The number of tests in this list.
    pub test_count: usize,

    /// The tests, in discovery order.
    pub tests: Vec<TestEntrySummary>,
}

impl TestListSummary {
    /// Creates a new summary with the given root and tests.
    pub fn new(root: impl Into<Utf8PathBuf>, tests: Vec<TestEntrySummary>) -> Self {
        Self {
            root: root.into(),
            test_count: tests.len(),
            tests,
        }
    }

    /// Parses JSON output from `simtest list --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}

/// A single discovered test entry point.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestEntrySummary {
    /// The path to the entry point file, relative to the root.
    pub path: Utf8PathBuf,

    /// The directory the entry point lives in, relative to the root. The test's launcher runs with
    /// this directory as its working directory.
    pub dir: Utf8PathBuf,
}
