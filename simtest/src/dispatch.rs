// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use owo_colors::{OwoColorize, Style};
use simtest_metadata::SimtestExitCode;
use simtest_runner::{
    config::SimtestConfig,
    discovery::{OutputFormat, SerializableFormat, TestList},
    errors::WriteEventError,
    reporter::TestReporter,
    runner::TestRunner,
    selection::{HELP_MODE, LIST_MODE, Selection, SelectionAction},
};
use std::io::Write;
use supports_color::Stream;
use swrite::{SWrite, swriteln};

/// Finds simulation test benches in a directory tree and runs them.
///
/// Every file named after the entry point (by default `go.sh`) below a `sim` directory is a test.
/// Each test runs in its own directory and passes if it prints the success marker.
#[derive(Debug, Parser)]
#[command(version, name = "simtest", styles = clap_styles::style())]
pub struct SimtestApp {
    /// `help`, `list`, or a substring that selects the tests to run [default: run all tests]
    #[arg(value_name = "MODE")]
    mode: Option<String>,

    /// Directory to search for tests [default: parent of the current directory]
    #[arg(long, value_name = "DIR", env = "SIMTEST_ROOT")]
    root: Option<Utf8PathBuf>,

    /// Config file [default: <root>/.config/simtest.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Output format for `list` [default: plain]
    #[arg(long, value_enum, value_name = "FMT")]
    message_format: Option<MessageFormatOpts>,

    #[command(flatten)]
    output: OutputOpts,
}

impl SimtestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the process exit code on success.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let action = SelectionAction::from_mode(self.mode.as_deref());
        if action == SelectionAction::ShowHelp {
            // Help never looks at the filesystem.
            write_modes_help(output, output_writer)?;
            return Ok(SimtestExitCode::OK);
        }
        if let Some(message_format) = self.message_format
            && action.runs_tests()
        {
            return Err(ExpectedError::MessageFormatWithoutList {
                message_format: message_format.as_str(),
            });
        }

        let root = resolve_root(self.root)?;
        let config = SimtestConfig::from_sources(&root, self.config_file.as_deref())?;
        let mut test_list = TestList::discover(root, &config.classifier())?;
        tracing::debug!(
            "discovered {} tests under `{}`",
            test_list.len(),
            test_list.root()
        );

        match action {
            SelectionAction::ListOnly => {
                if output.color.should_colorize(Stream::Stdout) {
                    test_list.colorize();
                }
                let mut writer = output_writer.stdout_writer();
                let message_format = self.message_format.unwrap_or_default();
                test_list.write(message_format.to_output_format(), &mut writer)?;
                writer.flush().map_err(WriteEventError::Io)?;
                Ok(SimtestExitCode::OK)
            }
            action => {
                let selection = Selection::from_action(&test_list, action);
                let runner = TestRunner::new(config.execution())?;

                let mut reporter = TestReporter::new();
                if output.color.should_colorize(Stream::Stdout) {
                    reporter.colorize();
                }

                let summary = output_writer.with_run_output(|echo, writer| {
                    runner.try_execute(&selection, echo, |event| {
                        reporter.report_event(event, &mut *writer)?;
                        // Flush after every event so that test output is interleaved correctly.
                        writer.flush().map_err(WriteEventError::Io)
                    })
                })?;

                if summary.is_success() {
                    Ok(summary.exit_code())
                } else {
                    Err(ExpectedError::test_run_failed())
                }
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormatOpts {
    #[default]
    Plain,
    Json,
    JsonPretty,
}

impl MessageFormatOpts {
    fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
        }
    }

    fn to_output_format(self) -> OutputFormat {
        match self {
            Self::Plain => OutputFormat::Plain,
            Self::Json => OutputFormat::Serializable(SerializableFormat::Json),
            Self::JsonPretty => OutputFormat::Serializable(SerializableFormat::JsonPretty),
        }
    }
}

/// Returns the absolute directory to discover tests in.
fn resolve_root(root: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    let current_dir = std::env::current_dir()
        .map_err(|err| ExpectedError::GetCurrentDirFailed { err })?;
    let current_dir = Utf8PathBuf::try_from(current_dir)
        .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })?;

    match root {
        Some(root) => Ok(current_dir.join(root)),
        None => match current_dir.parent() {
            Some(parent) => Ok(parent.to_owned()),
            None => Err(ExpectedError::NoDefaultRoot { current_dir }),
        },
    }
}

fn write_modes_help(output: OutputContext, output_writer: &mut OutputWriter) -> Result<()> {
    let mut literal = Style::new();
    if output.color.should_colorize(Stream::Stdout) {
        literal = literal.cyan().bold();
    }

    let modes: [(&str, &str); 4] = [
        ("(none)", "run every test under the root"),
        (HELP_MODE, "print this message"),
        (LIST_MODE, "list every test without running it"),
        ("<substring>", "run the tests whose path contains <substring>"),
    ];

    let mut help = String::new();
    swriteln!(help, "Usage: simtest [OPTIONS] [MODE]\n");
    swriteln!(help, "Modes:");
    for (mode, description) in modes {
        swriteln!(help, "  {:<13} {description}", mode.style(literal));
    }
    swriteln!(help, "\nSee `simtest --help` for options.");

    let mut writer = output_writer.stdout_writer();
    writer
        .write_all(help.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(WriteEventError::Io)?;
    Ok(())
}
