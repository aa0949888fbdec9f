// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino::Utf8Path;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use simtest_runner::{
    config::SimtestConfig,
    discovery::{TestEntry, TestList},
    errors::ExecuteError,
    reporter::TestReporter,
    runner::{EchoOutput, RunOutcome, TestRunner},
    selection::Selection,
};
use simtest_metadata::SimtestExitCode;
use std::env;

fn run_one(tree: &BenchTree, path: &str, script: &str) -> Result<RunOutcome> {
    tree.write(path, script)?;
    let runner = default_runner()?;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    Ok(runner.run_test(
        tree.root(),
        &TestEntry::new(path),
        &mut EchoOutput::Buffer {
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
    ))
}

fn two_case_suite(case2_script: &str) -> Result<(BenchTree, TestList)> {
    let tree = BenchTree::new()?;
    tree.write("suite/case1/go.sh", PASSING_SCRIPT)?;
    tree.write("suite/case2/go.sh", case2_script)?;
    let list = TestList::discover(tree.root(), &any_ancestor_classifier())?;
    Ok((tree, list))
}

#[test]
fn all_tests_pass() -> Result<()> {
    let _lock = lock_cwd();
    let (_tree, list) = two_case_suite(PASSING_SCRIPT)?;

    let run = run_captured(&default_runner()?, &list, None);

    assert_eq!(run.summary.total, 2);
    assert_eq!(run.summary.passed, 2);
    assert_eq!(run.summary.failed, 0);
    assert_eq!(run.summary.exit_code(), SimtestExitCode::OK);
    assert_eq!(
        run.events,
        [
            "run-started 2",
            "started suite/case1/go.sh",
            "finished suite/case1/go.sh",
            "started suite/case2/go.sh",
            "finished suite/case2/go.sh",
            "run-finished 2",
        ]
    );
    Ok(())
}

#[test]
fn one_test_without_marker_fails_the_run() -> Result<()> {
    let _lock = lock_cwd();
    let (_tree, list) = two_case_suite(SILENT_SCRIPT)?;

    let run = run_captured(&default_runner()?, &list, None);

    assert_eq!(run.summary.total, 2);
    assert_eq!(run.summary.passed, 1);
    assert_eq!(run.summary.failed, 1);
    assert_eq!(run.summary.failed_dirs, ["suite/case2"]);
    assert_eq!(run.summary.exit_code(), SimtestExitCode::TEST_RUN_FAILED);
    Ok(())
}

#[test]
fn filter_runs_matching_tests_only() -> Result<()> {
    let _lock = lock_cwd();
    let (_tree, list) = two_case_suite(SILENT_SCRIPT)?;

    let run = run_captured(&default_runner()?, &list, Some("case1"));

    assert_eq!(run.summary.total, 1);
    assert_eq!(run.summary.passed, 1);
    assert_eq!(run.summary.failed, 0);
    assert_eq!(run.outcomes.len(), 1);
    assert_eq!(run.outcomes[0].entry().full_path().as_str(), "suite/case1/go.sh");
    Ok(())
}

#[test]
fn filter_matching_nothing_passes() -> Result<()> {
    let _lock = lock_cwd();
    let (_tree, list) = two_case_suite(SILENT_SCRIPT)?;

    let run = run_captured(&default_runner()?, &list, Some("ldpc"));

    assert_eq!(run.summary.total, 0);
    assert!(run.summary.is_success());
    assert_eq!(run.summary.exit_code(), SimtestExitCode::OK);
    assert_eq!(run.events, ["run-started 0", "run-finished 0"]);
    Ok(())
}

#[test]
fn empty_tree_passes() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;
    let list = TestList::discover(tree.root(), &any_ancestor_classifier())?;

    let run = run_captured(&default_runner()?, &list, None);

    assert_eq!(run.summary.total, 0);
    assert_eq!(run.summary.exit_code(), SimtestExitCode::OK);
    Ok(())
}

#[test]
fn every_marker_occurrence_counts() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;

    let outcome = run_one(
        &tree,
        "nco/sim/go.sh",
        "echo '<<TB_SUCCESS>>'\necho 'checking'\necho 'done <<TB_SUCCESS>>'\n",
    )?;
    assert_eq!(outcome.marker_count(), 2);
    assert!(outcome.passed());

    let outcome = run_one(
        &tree,
        "cic/sim/go.sh",
        "echo '<<TB_SUCCESS>><<TB_SUCCESS>> <<TB_SUCCESS>>'\n",
    )?;
    assert_eq!(outcome.marker_count(), 3, "non-overlapping occurrences on one line");

    let outcome = run_one(&tree, "fir/sim/go.sh", "echo '<<TB_SUCCESS>'\necho 'TB_SUCCESS'\n")?;
    assert_eq!(outcome.marker_count(), 0, "partial markers don't count");
    assert!(!outcome.passed());
    Ok(())
}

#[test]
fn exit_code_does_not_decide_the_result() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;

    let outcome = run_one(&tree, "a/sim/go.sh", SILENT_SCRIPT)?;
    assert_eq!(outcome.exit_code(), Some(0));
    assert!(!outcome.passed(), "clean exit without the marker fails");
    assert!(outcome.failure().is_none());

    let outcome = run_one(&tree, "b/sim/go.sh", "echo '<<TB_SUCCESS>>'\nexit 3\n")?;
    assert_eq!(outcome.exit_code(), Some(3));
    assert!(outcome.passed(), "marker with a nonzero exit passes");
    Ok(())
}

#[test]
fn marker_on_stderr_is_not_counted() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;

    let outcome = run_one(
        &tree,
        "nco/sim/go.sh",
        "echo 'to stdout'\necho '<<TB_SUCCESS>>' >&2\n",
    )?;

    assert_eq!(outcome.marker_count(), 0);
    assert!(!outcome.passed());
    assert_eq!(outcome.stdout(), ["to stdout"]);
    assert_eq!(outcome.stderr(), [MARKER]);
    Ok(())
}

#[test]
fn output_is_echoed_line_by_line() -> Result<()> {
    let _lock = lock_cwd();
    let (_tree, list) = two_case_suite("echo 'first'\necho 'oops' >&2\necho '<<TB_SUCCESS>>'\n")?;

    let run = run_captured(&default_runner()?, &list, Some("case2"));

    assert_eq!(run.stdout, "first\n<<TB_SUCCESS>>\n");
    assert_eq!(run.stderr, "oops\n");
    assert_eq!(run.outcomes[0].stdout(), ["first", MARKER]);
    assert_eq!(run.outcomes[0].stderr(), ["oops"]);
    Ok(())
}

#[test]
fn non_utf8_output_is_decoded_lossily() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;

    let outcome = run_one(
        &tree,
        "nco/sim/go.sh",
        "printf 'bad \\377 byte\\n'\necho '<<TB_SUCCESS>>'\n",
    )?;

    assert!(outcome.passed());
    assert_eq!(outcome.stdout()[0], "bad \u{FFFD} byte");
    Ok(())
}

#[test]
fn heavy_stderr_does_not_stall_stdout() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;

    // Enough output to fill a pipe buffer several times over.
    let outcome = run_one(
        &tree,
        "nco/sim/go.sh",
        "i=0\nwhile [ $i -lt 4000 ]; do\n  echo \"stderr line $i with some padding to fill the pipe\" >&2\n  i=$((i+1))\ndone\necho '<<TB_SUCCESS>>'\n",
    )?;

    assert!(outcome.passed());
    assert_eq!(outcome.stderr().len(), 4000);
    Ok(())
}

#[test]
fn runs_in_containing_dir_and_restores_cwd() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;
    let before = env::current_dir()?;

    let outcome = run_one(
        &tree,
        "upconverter/sim/tb_upconverter/go.sh",
        "pwd\necho \"$SIMTEST_TEST_DIR\"\necho \"$SIMTEST\"\necho '<<TB_SUCCESS>>'\n",
    )?;

    let expected_dir = tree
        .root()
        .join("upconverter/sim/tb_upconverter")
        .canonicalize_utf8()?;
    assert!(outcome.passed());
    assert_eq!(
        Utf8Path::new(&outcome.stdout()[0]).canonicalize_utf8()?,
        expected_dir
    );
    assert_eq!(outcome.stdout()[1], expected_dir.as_str());
    assert_eq!(outcome.stdout()[2], "1");
    assert_eq!(env::current_dir()?, before, "working directory restored");
    Ok(())
}

#[test]
fn missing_launcher_fails_every_test_and_continues() -> Result<()> {
    let _lock = lock_cwd();
    let (tree, list) = two_case_suite(PASSING_SCRIPT)?;
    let config_file = tree.write(
        "launcher.toml",
        "[execution]\nlauncher = \"simtest-no-such-launcher --flag\"\n",
    )?;
    let config = SimtestConfig::from_sources(tree.root(), Some(&config_file))?;
    let runner = TestRunner::new(config.execution())?;

    let run = run_captured(&runner, &list, None);

    assert_eq!(run.summary.total, 2);
    assert_eq!(run.summary.failed, 2);
    for outcome in &run.outcomes {
        assert!(!outcome.passed());
        assert_eq!(outcome.exit_code(), None);
        match outcome.failure() {
            Some(ExecuteError::Spawn { command, .. }) => {
                assert_eq!(command, "simtest-no-such-launcher --flag ./go.sh");
            }
            other => panic!("expected a spawn failure, found {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn missing_test_dir_is_recorded_as_failure() -> Result<()> {
    let _lock = lock_cwd();
    let tree = BenchTree::new()?;
    let before = env::current_dir()?;

    let runner = default_runner()?;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let outcome = runner.run_test(
        tree.root(),
        &TestEntry::new("gone/sim/go.sh"),
        &mut EchoOutput::Buffer {
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
    );

    ensure!(
        matches!(outcome.failure(), Some(ExecuteError::ChangeDir { .. })),
        "expected a change dir failure, found {:?}",
        outcome.failure()
    );
    assert!(!outcome.passed());
    assert_eq!(env::current_dir()?, before);
    Ok(())
}

#[test]
fn reporter_describes_the_run() -> Result<()> {
    let _lock = lock_cwd();
    let (_tree, list) = two_case_suite(SILENT_SCRIPT)?;
    let runner = default_runner()?;
    let selection = Selection::new(&list, None);

    let mut reporter = TestReporter::new();
    let mut report = Vec::new();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let summary = runner.try_execute(
        &selection,
        &mut EchoOutput::Buffer {
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
        |event| reporter.report_event(event, &mut report),
    )?;

    let report = String::from_utf8(report)?;
    assert_eq!(summary.failed, 1);
    assert!(report.contains("Running all tests:"), "report: {report}");
    assert!(report.contains("START"), "report: {report}");
    assert!(
        report.contains("suite/case1/go.sh: success marker found 1 time, exit code 0"),
        "report: {report}"
    );
    assert!(
        report.contains("suite/case2/go.sh: success marker found 0 times, exit code 0"),
        "report: {report}"
    );
    assert!(
        report.contains("2 tests run: 1 passed, 1 failed"),
        "report: {report}"
    );
    assert!(report.ends_with("  --> suite/case2\n"), "report: {report}");
    Ok(())
}
