// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use simtest_runner::{
    classifier::SubstringClassifier,
    config::SimtestConfig,
    discovery::TestList,
    reporter::TestEvent,
    runner::{EchoOutput, RunOutcome, TestRunner},
    selection::Selection,
    summary::RunSummary,
};
use std::sync::{Mutex, MutexGuard};

pub(crate) const MARKER: &str = "<<TB_SUCCESS>>";

/// A test bench script that prints the success marker once.
pub(crate) const PASSING_SCRIPT: &str = "echo 'running bench'\necho '<<TB_SUCCESS>>'\n";

/// A test bench script that finishes cleanly without printing the success marker.
pub(crate) const SILENT_SCRIPT: &str = "echo 'running bench'\nexit 0\n";

// Running a test changes the process working directory, which every test in this binary shares.
static CWD_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn lock_cwd() -> MutexGuard<'static, ()> {
    // A panicking test leaves the lock poisoned, but the working directory is still restored.
    CWD_LOCK.lock().unwrap_or_else(|err| err.into_inner())
}

/// A temporary directory tree of test benches.
pub(crate) struct BenchTree {
    dir: Utf8TempDir,
}

impl BenchTree {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            dir: Utf8TempDir::with_prefix("simtest-")?,
        })
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        self.dir.path()
    }

    /// Writes `contents` to `path`, creating parent directories as needed.
    pub(crate) fn write(&self, path: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.root().join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub(crate) fn mkdir(&self, path: &str) -> Result<()> {
        std::fs::create_dir_all(self.root().join(path))?;
        Ok(())
    }
}

/// The default classifier, without the ancestor segment requirement.
pub(crate) fn any_ancestor_classifier() -> SubstringClassifier {
    SubstringClassifier::new([".git", ".idea", "template"], "", "go.sh")
}

pub(crate) fn default_runner() -> Result<TestRunner> {
    Ok(TestRunner::new(SimtestConfig::default().execution())?)
}

/// The result of running a selection with output captured in memory.
pub(crate) struct CapturedRun {
    pub(crate) summary: RunSummary,
    pub(crate) outcomes: Vec<RunOutcome>,
    pub(crate) events: Vec<String>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

pub(crate) fn run_captured(
    runner: &TestRunner,
    list: &TestList,
    mode: Option<&str>,
) -> CapturedRun {
    let selection = Selection::new(list, mode);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut outcomes = Vec::new();
    let mut events = Vec::new();

    let summary = runner.execute(
        &selection,
        &mut EchoOutput::Buffer {
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
        |event| match event {
            TestEvent::RunStarted { selection } => {
                events.push(format!("run-started {}", selection.len()));
            }
            TestEvent::TestStarted { entry, .. } => {
                events.push(format!("started {}", entry.full_path()));
            }
            TestEvent::TestFinished { outcome } => {
                events.push(format!("finished {}", outcome.entry().full_path()));
                outcomes.push(outcome.clone());
            }
            TestEvent::RunFinished { summary, .. } => {
                events.push(format!("run-finished {}", summary.total));
            }
            _ => {}
        },
    );

    CapturedRun {
        summary,
        outcomes,
        events,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    }
}
