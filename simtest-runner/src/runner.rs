// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test runner.
//!
//! The main structure in this module is [`TestRunner`]. Tests are run strictly one at a time: each
//! test's launcher runs inside the test's directory, and its output is streamed back line by line
//! while the runner looks for the success marker.

mod cwd;

use crate::{
    config::ExecutionConfig,
    discovery::TestEntry,
    errors::{ExecuteError, TestRunnerBuildError},
    reporter::TestEvent,
    selection::Selection,
    stopwatch::StopwatchStart,
    summary::RunSummary,
};
use aho_corasick::AhoCorasick;
use camino::{Utf8Path, Utf8PathBuf};
use std::{
    convert::Infallible,
    io::{self, Write},
    process::Stdio,
    sync::Arc,
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command},
    runtime::Runtime,
};

/// Environment variable set to `1` in every test process.
pub const SIMTEST_ENV: &str = "SIMTEST";

/// Environment variable set to the absolute working directory of every test process.
pub const SIMTEST_TEST_DIR_ENV: &str = "SIMTEST_TEST_DIR";

/// Where test output is echoed to while it is being captured.
#[derive(Debug)]
pub enum EchoOutput<'a> {
    /// Echo to the harness's own standard output and standard error.
    Terminal,

    /// Echo to in-memory buffers.
    Buffer {
        /// Receives lines the test wrote to standard output.
        stdout: &'a mut Vec<u8>,

        /// Receives lines the test wrote to standard error.
        stderr: &'a mut Vec<u8>,
    },
}

impl EchoOutput<'_> {
    fn write_stdout_line(&mut self, line: &[u8]) -> io::Result<()> {
        match self {
            EchoOutput::Terminal => write_line(io::stdout().lock(), line),
            EchoOutput::Buffer { stdout, .. } => write_line(&mut **stdout, line),
        }
    }

    fn write_stderr_line(&mut self, line: &[u8]) -> io::Result<()> {
        match self {
            EchoOutput::Terminal => write_line(io::stderr().lock(), line),
            EchoOutput::Buffer { stderr, .. } => write_line(&mut **stderr, line),
        }
    }
}

fn write_line(mut writer: impl Write, line: &[u8]) -> io::Result<()> {
    writer.write_all(line)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// The result of running a single test.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    entry: TestEntry,
    marker_count: usize,
    stdout: Vec<String>,
    stderr: Vec<String>,
    exit_code: Option<i32>,
    time_taken: Duration,
    failure: Option<ExecuteError>,
}

impl RunOutcome {
    /// Returns the test this outcome is for.
    pub fn entry(&self) -> &TestEntry {
        &self.entry
    }

    /// Returns true if the test passed.
    ///
    /// A test passes if and only if it printed the success marker at least once and nothing went
    /// wrong while running it. The exit code of the test process is not considered.
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.marker_count > 0
    }

    /// Returns the number of times the success marker appeared on standard output.
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Returns the lines the test wrote to standard output, in order.
    pub fn stdout(&self) -> &[String] {
        &self.stdout
    }

    /// Returns the lines the test wrote to standard error, in order.
    pub fn stderr(&self) -> &[String] {
        &self.stderr
    }

    /// Returns the exit code of the test process, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns how long the test took to run.
    pub fn time_taken(&self) -> Duration {
        self.time_taken
    }

    /// Returns the error that caused this test to be recorded as failed without being judged on
    /// its output, if any.
    pub fn failure(&self) -> Option<&ExecuteError> {
        self.failure.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(entry: TestEntry, marker_count: usize) -> Self {
        Self {
            entry,
            marker_count,
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: Some(0),
            time_taken: Duration::ZERO,
            failure: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_failure(mut self, failure: ExecuteError) -> Self {
        self.failure = Some(failure);
        self
    }
}

/// Context for running tests.
#[derive(Debug)]
pub struct TestRunner {
    launcher: Vec<String>,
    success_marker: String,
    matcher: AhoCorasick,
    runtime: Runtime,
}

impl TestRunner {
    /// Creates a new test runner from the execution config.
    pub fn new(config: &ExecutionConfig) -> Result<Self, TestRunnerBuildError> {
        let success_marker = config.success_marker().to_owned();
        let matcher = AhoCorasick::new([&success_marker]).map_err(|err| {
            TestRunnerBuildError::MarkerMatcher {
                marker: success_marker.clone(),
                err,
            }
        })?;

        // Tests are run one at a time, so a single thread is all that's needed.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TestRunnerBuildError::TokioRuntimeCreate)?;

        Ok(Self {
            launcher: config.launcher().to_vec(),
            success_marker,
            matcher,
            runtime,
        })
    }

    /// Returns the success marker this runner looks for.
    pub fn success_marker(&self) -> &str {
        &self.success_marker
    }

    /// Runs every test in the selection, in order.
    ///
    /// The callback is called with the results of each test.
    pub fn execute<F>(
        &self,
        selection: &Selection<'_>,
        echo: &mut EchoOutput<'_>,
        mut callback: F,
    ) -> RunSummary
    where
        F: FnMut(TestEvent<'_>),
    {
        self.try_execute::<Infallible, _>(selection, echo, |event| {
            callback(event);
            Ok(())
        })
        .unwrap_or_else(|never| match never {})
    }

    /// Runs every test in the selection, in order.
    ///
    /// Accepts a callback that is called with the results of each test. If the callback returns an
    /// error, the run stops and the callback is no longer called.
    ///
    /// Failures to run an individual test never stop the run: they are recorded as failed
    /// outcomes.
    pub fn try_execute<E, F>(
        &self,
        selection: &Selection<'_>,
        echo: &mut EchoOutput<'_>,
        mut callback: F,
    ) -> Result<RunSummary, E>
    where
        F: FnMut(TestEvent<'_>) -> Result<(), E>,
    {
        let stopwatch = StopwatchStart::now();
        callback(TestEvent::RunStarted { selection })?;

        let mut outcomes = Vec::with_capacity(selection.len());
        for &entry in selection.entries() {
            let working_dir = entry.working_dir(selection.root());
            callback(TestEvent::TestStarted {
                entry,
                working_dir: &working_dir,
            })?;

            let outcome = self.run_in_dir(entry, &working_dir, echo);
            callback(TestEvent::TestFinished { outcome: &outcome })?;
            outcomes.push(outcome);
        }

        let summary = RunSummary::from_outcomes(&outcomes);
        callback(TestEvent::RunFinished {
            summary: &summary,
            elapsed: stopwatch.elapsed(),
        })?;
        Ok(summary)
    }

    /// Runs a single test whose paths are relative to `root`.
    ///
    /// The process working directory is changed to the test's directory for the duration of the
    /// test and restored afterwards.
    pub fn run_test(
        &self,
        root: &Utf8Path,
        entry: &TestEntry,
        echo: &mut EchoOutput<'_>,
    ) -> RunOutcome {
        self.run_in_dir(entry, &entry.working_dir(root), echo)
    }

    fn run_in_dir(
        &self,
        entry: &TestEntry,
        working_dir: &Utf8Path,
        echo: &mut EchoOutput<'_>,
    ) -> RunOutcome {
        let stopwatch = StopwatchStart::now();
        tracing::debug!("running `{}` in `{working_dir}`", entry.full_path());

        // Resolved before the working directory changes, since `working_dir` may be relative.
        let test_dir = absolute_dir(working_dir);
        let res = cwd::with_current_dir(working_dir, || {
            self.runtime
                .block_on(self.run_child(entry, &test_dir, echo))
        });

        let output = match res {
            Ok(output) => output,
            Err(err) => ChildOutput::failed(ExecuteError::ChangeDir {
                dir: working_dir.to_owned(),
                err: Arc::new(err),
            }),
        };

        RunOutcome {
            entry: entry.clone(),
            marker_count: output.marker_count,
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            time_taken: stopwatch.elapsed(),
            failure: output.failure,
        }
    }

    async fn run_child(
        &self,
        entry: &TestEntry,
        test_dir: &Utf8Path,
        echo: &mut EchoOutput<'_>,
    ) -> ChildOutput {
        let (program, args) = match self.launcher.split_first() {
            Some(split) => split,
            None => unreachable!("launcher is validated to be non-empty"),
        };
        let script = format!("./{}", entry.file_name());

        let mut command = Command::new(program);
        command
            .args(args)
            .arg(&script)
            .env(SIMTEST_ENV, "1")
            .env(SIMTEST_TEST_DIR_ENV, test_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                let command = shell_words::join(self.launcher.iter().chain([&script]));
                return ChildOutput::failed(ExecuteError::Spawn {
                    command,
                    err: Arc::new(err),
                });
            }
        };

        let mut output = ChildOutput::default();
        if let Err(err) = self.collect_output(&mut child, echo, &mut output).await {
            // The pipes are in an unknown state, so don't wait for the test to finish by itself.
            if let Err(kill_err) = child.start_kill() {
                tracing::debug!("failed to kill test process: {kill_err}");
            }
            output.failure = Some(err);
        }

        match child.wait().await {
            Ok(status) => output.exit_code = status.code(),
            Err(err) => {
                output
                    .failure
                    .get_or_insert(ExecuteError::Wait(Arc::new(err)));
            }
        }

        output
    }

    async fn collect_output(
        &self,
        child: &mut Child,
        echo: &mut EchoOutput<'_>,
        output: &mut ChildOutput,
    ) -> Result<(), ExecuteError> {
        let stdout = child.stdout.take().expect("stdout was set to piped");
        let stderr = child.stderr.take().expect("stderr was set to piped");

        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');

        let mut out_done = false;
        let mut err_done = false;
        let mut echo_failed = false;

        while !out_done || !err_done {
            tokio::select! {
                res = stdout.next_segment(), if !out_done => {
                    match res.map_err(|err| ExecuteError::ReadStdout(Arc::new(err)))? {
                        Some(line) => {
                            let line = trim_cr(&line);
                            output.marker_count += self.matcher.find_iter(line).count();
                            if let Err(err) = echo.write_stdout_line(line) {
                                report_echo_error(&mut echo_failed, err);
                            }
                            output.stdout.push(String::from_utf8_lossy(line).into_owned());
                        }
                        None => out_done = true,
                    }
                }
                res = stderr.next_segment(), if !err_done => {
                    match res.map_err(|err| ExecuteError::ReadStderr(Arc::new(err)))? {
                        Some(line) => {
                            let line = trim_cr(&line);
                            if let Err(err) = echo.write_stderr_line(line) {
                                report_echo_error(&mut echo_failed, err);
                            }
                            output.stderr.push(String::from_utf8_lossy(line).into_owned());
                        }
                        None => err_done = true,
                    }
                }
            }
        }

        Ok(())
    }
}

/// What was observed while a child process ran.
#[derive(Debug, Default)]
struct ChildOutput {
    marker_count: usize,
    stdout: Vec<String>,
    stderr: Vec<String>,
    exit_code: Option<i32>,
    failure: Option<ExecuteError>,
}

impl ChildOutput {
    fn failed(failure: ExecuteError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn report_echo_error(echo_failed: &mut bool, err: io::Error) {
    // Only warn once per test; a closed terminal fails every subsequent write too.
    if !*echo_failed {
        tracing::warn!("failed to echo test output: {err}");
        *echo_failed = true;
    }
}

fn absolute_dir(dir: &Utf8Path) -> Utf8PathBuf {
    dir.canonicalize_utf8().unwrap_or_else(|_| dir.to_owned())
}
