// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints out test execution statuses.
//!
//! The main structure in this module is [`TestReporter`].

use crate::{
    discovery::{self, TestEntry},
    errors::WriteEventError,
    runner::RunOutcome,
    selection::{Selection, SelectionAction},
    summary::RunSummary,
};
use camino::Utf8Path;
use owo_colors::{OwoColorize, Style};
use std::{
    error::Error,
    io::{self, Write},
    time::Duration,
};

/// A test event, produced by the runner and consumed by a reporter.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum TestEvent<'a> {
    /// The run started.
    RunStarted {
        /// The tests about to be run.
        selection: &'a Selection<'a>,
    },

    /// A test started running.
    TestStarted {
        /// The test.
        entry: &'a TestEntry,

        /// The absolute directory the test runs in.
        working_dir: &'a Utf8Path,
    },

    /// A test finished running.
    TestFinished {
        /// The outcome of the test.
        outcome: &'a RunOutcome,
    },

    /// The run finished.
    RunFinished {
        /// Statistics for the run.
        summary: &'a RunSummary,

        /// How long the whole run took.
        elapsed: Duration,
    },
}

/// Writes human-readable test statuses.
#[derive(Debug, Default)]
pub struct TestReporter {
    styles: Box<Styles>,
}

impl TestReporter {
    /// Creates a new reporter with uncolored output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Report a test event.
    pub fn report_event(
        &mut self,
        event: TestEvent<'_>,
        writer: impl Write,
    ) -> Result<(), WriteEventError> {
        self.write_event_impl(&event, writer)
            .map_err(WriteEventError::Io)
    }

    fn write_event_impl(&self, event: &TestEvent<'_>, mut writer: impl Write) -> io::Result<()> {
        match event {
            TestEvent::RunStarted { selection } => {
                self.write_selection_header(selection, &mut writer)?;

                write!(writer, "{:>12} ", "Starting".style(self.styles.pass))?;
                writeln!(
                    writer,
                    "{} tests under {}",
                    selection.len().style(self.styles.count),
                    selection.root(),
                )?;
            }
            TestEvent::TestStarted { entry, working_dir } => {
                // The spacing is to align test names with the duration of finished tests.
                write!(
                    writer,
                    "{:>12}             ",
                    "START".style(self.styles.pass)
                )?;
                writeln!(
                    writer,
                    "{} (cd to {working_dir})",
                    entry.full_path().style(self.styles.list.path),
                )?;
            }
            TestEvent::TestFinished { outcome } => {
                if outcome.passed() {
                    write!(writer, "{:>12} ", "PASS".style(self.styles.pass))?;
                } else {
                    write!(writer, "{:>12} ", "FAIL".style(self.styles.fail))?;
                }
                self.write_duration(outcome.time_taken(), &mut writer)?;
                write!(
                    writer,
                    "{}: ",
                    outcome.entry().full_path().style(self.styles.list.path)
                )?;

                match outcome.failure() {
                    Some(error) => {
                        writeln!(writer, "{}", error.style(self.styles.fail))?;
                        let mut source = error.source();
                        while let Some(err) = source {
                            writeln!(
                                writer,
                                "{:>12} {err}",
                                "caused by:".style(self.styles.fail)
                            )?;
                            source = err.source();
                        }
                    }
                    None => {
                        self.write_marker_count(outcome.marker_count(), &mut writer)?;
                        match outcome.exit_code() {
                            Some(code) => writeln!(writer, ", exit code {code}")?,
                            None => writeln!(writer, ", no exit code")?,
                        }
                    }
                }
            }
            TestEvent::RunFinished { summary, elapsed } => {
                writeln!(writer, "------------")?;

                let summary_style = if summary.is_success() {
                    self.styles.pass
                } else {
                    self.styles.fail
                };
                write!(writer, "{:>12} ", "Summary".style(summary_style))?;
                self.write_duration(*elapsed, &mut writer)?;
                writeln!(
                    writer,
                    "{} tests run: {} {}, {} {}",
                    summary.total.style(self.styles.count),
                    summary.passed.style(self.styles.count),
                    "passed".style(self.styles.pass),
                    summary.failed.style(self.styles.count),
                    "failed".style(self.styles.fail),
                )?;

                if summary.is_success() {
                    writeln!(writer, "\n{}", "All Tests Passed".style(self.styles.pass))?;
                } else {
                    writeln!(writer, "\n{}\n", "List of failed tests:".style(self.styles.fail))?;
                    for dir in &summary.failed_dirs {
                        // An entry point at the root has an empty containing directory.
                        let dir = if dir.as_str().is_empty() {
                            "."
                        } else {
                            dir.as_str()
                        };
                        writeln!(writer, "  --> {}", dir.style(self.styles.fail))?;
                    }
                }
            }
        }

        Ok(())
    }

    fn write_selection_header(
        &self,
        selection: &Selection<'_>,
        mut writer: impl Write,
    ) -> io::Result<()> {
        match selection.action() {
            SelectionAction::RunFiltered { substring } => {
                writeln!(
                    writer,
                    "\n{} tests with {} were found:\n",
                    selection.len().style(self.styles.count),
                    substring.style(self.styles.list.header),
                )?;
            }
            SelectionAction::RunAll => {
                writeln!(writer, "\n{}\n", "Running all tests:".style(self.styles.list.header))?;
            }
            // Nothing is run for these.
            SelectionAction::ShowHelp | SelectionAction::ListOnly => return Ok(()),
        }

        discovery::write_entry_paths(
            selection.entries().iter().copied(),
            &self.styles.list,
            &mut writer,
        )?;
        writeln!(writer)
    }

    fn write_marker_count(&self, count: usize, mut writer: impl Write) -> io::Result<()> {
        let times = if count == 1 { "time" } else { "times" };
        let style = if count > 0 {
            self.styles.pass
        } else {
            self.styles.fail
        };
        write!(
            writer,
            "success marker found {} {times}",
            count.style(style)
        )
    }

    fn write_duration(&self, duration: Duration, mut writer: impl Write) -> io::Result<()> {
        // * > means right-align.
        // * 8 is the number of characters to pad to.
        // * .3 means print three digits after the decimal point.
        write!(writer, "[{:>8.3?}s] ", duration.as_secs_f64())
    }
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    list: discovery::Styles,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.list.colorize();
    }
}
