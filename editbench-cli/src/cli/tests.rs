//! Unit tests for argument parsing, configuration folding, and rendering.

use super::commands::{build_config, run_command};
use super::{Cli, CliError, Command, ExecutionSummary, RunCommand, render_summary, run_cli};

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use editbench_core::{HarnessError, RunSummary};
use editbench_test_support::tracing::RecordingLayer;
use rstest::rstest;
use tempfile::TempDir;

fn parse(args: &[&str]) -> RunCommand {
    let cli = Cli::try_parse_from(args).expect("arguments must parse");
    match cli.command {
        Command::Run(run) => run,
    }
}

#[test]
fn run_accepts_every_option() {
    let run = parse(&[
        "editbench",
        "run",
        "--workdir",
        "/w",
        "--solver",
        "/opt/yoshiko",
        "--input-dir",
        "/data",
        "--report",
        "/tmp/out.csv",
        "--timeout-secs",
        "60",
        "--threads",
        "4",
        "--report-rejected",
    ]);
    assert_eq!(run.workdir, Some(PathBuf::from("/w")));
    assert_eq!(run.timeout_secs, Some(60));
    assert_eq!(run.threads, Some(4));
    assert!(run.report_rejected);
}

#[test]
fn run_rejects_non_numeric_timeout() {
    let parsed = Cli::try_parse_from(["editbench", "run", "--timeout-secs", "soon"]);
    assert!(parsed.is_err());
}

#[test]
fn build_config_applies_defaults_under_workdir() {
    let config = build_config(&RunCommand::default(), Path::new("/w")).expect("defaults are valid");
    assert_eq!(config.solver(), Path::new("/w/yoshiko"));
    assert_eq!(config.input_dir(), Path::new("/w/test"));
    assert_eq!(config.report(), Path::new("/w/optimum.csv"));
    assert_eq!(config.timeout(), Duration::from_secs(1800));
}

#[test]
fn build_config_prefers_explicit_paths() {
    let run = parse(&["editbench", "run", "--solver", "/bin/solver", "--threads", "2"]);
    let config = build_config(&run, Path::new("/w")).expect("options are valid");
    assert_eq!(config.solver(), Path::new("/bin/solver"));
    assert_eq!(config.threads().get(), 2);
}

#[rstest]
#[case::timeout(&["editbench", "run", "--timeout-secs", "0"], "timeout_secs")]
#[case::threads(&["editbench", "run", "--threads", "0"], "threads")]
fn build_config_rejects_zero_values(#[case] args: &[&str], #[case] expected: &str) {
    let err = build_config(&parse(args), Path::new("/w")).expect_err("zero is out of range");
    assert!(matches!(err, HarnessError::InvalidConfig { field } if field == expected));
}

#[test]
fn run_command_without_solver_is_fatal_and_traced() {
    let dir = TempDir::new().expect("temp dir");
    let command = RunCommand {
        workdir: Some(dir.path().to_path_buf()),
        ..RunCommand::default()
    };

    let (result, layer) = RecordingLayer::capture(|| run_command(&command));

    let err = result.expect_err("solver is missing");
    assert!(matches!(
        err,
        CliError::Harness(HarnessError::MissingBinary { .. })
    ));
    let spans = layer.spans_named("cli.execute");
    assert_eq!(spans.len(), 1);
    let solver = dir.path().join("yoshiko");
    assert_eq!(
        spans[0].field("solver"),
        Some(solver.display().to_string().as_str())
    );
}

#[test]
fn run_cli_records_the_command() {
    let dir = TempDir::new().expect("temp dir");
    let cli = Cli {
        command: Command::Run(RunCommand {
            workdir: Some(dir.path().to_path_buf()),
            ..RunCommand::default()
        }),
    };

    let (result, layer) = RecordingLayer::capture(|| run_cli(cli));

    assert!(result.is_err());
    let spans = layer.spans_named("cli.run");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].field("command"), Some("run"));
}

#[test]
fn render_summary_lists_every_count() {
    let summary = ExecutionSummary {
        report: PathBuf::from("/w/optimum.csv"),
        summary: RunSummary {
            discovered: 3,
            solved: 1,
            rejected: 2,
            rows: 1,
            ..RunSummary::default()
        },
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer).expect("render succeeds");
    let text = String::from_utf8(buffer).expect("UTF-8 output");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], "report: /w/optimum.csv");
    assert!(lines.contains(&"rejected: 2"));
    assert!(lines.contains(&"solved: 1"));
}
