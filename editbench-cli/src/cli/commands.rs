//! Command implementations and argument parsing for the editbench CLI.

use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use editbench_core::{
    Harness, HarnessConfig, HarnessConfigBuilder, HarnessError, RunSummary, solver,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "editbench",
    about = "Run a cluster-editing solver over a directory of graphs."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Convert, solve, and report every input under the input directory.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone, Default)]
pub struct RunCommand {
    /// Working directory holding the solver, inputs, and report (defaults to
    /// the current directory).
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Solver executable (defaults to `<workdir>/yoshiko`).
    #[arg(long)]
    pub solver: Option<PathBuf>,

    /// Directory scanned recursively for `.gr` and `.graph6` files
    /// (defaults to `<workdir>/test`).
    #[arg(long = "input-dir")]
    pub input_dir: Option<PathBuf>,

    /// CSV report rows are appended to (defaults to `<workdir>/optimum.csv`).
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Per-job solver time budget in seconds (defaults to 1800).
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// Thread hint passed to the solver (defaults to logical CPUs minus two).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Write an `Err` report row for inputs that fail validation.
    #[arg(long = "report-rejected")]
    pub report_rejected: bool,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The current directory could not be determined.
    #[error("failed to resolve the working directory: {source}")]
    Workdir {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The harness aborted the run.
    #[error(transparent)]
    Harness(#[from] HarnessError),
}

/// Outcome of a completed `run` command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Report file rows were appended to.
    pub report: PathBuf,
    /// Per-outcome job counts.
    pub summary: RunSummary,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the working directory cannot be resolved, the
/// configuration is invalid, or the harness aborts.
///
/// # Examples
/// ```
/// # use editbench_cli::cli::{Cli, CliError, Command, RunCommand, run_cli};
/// # use editbench_core::HarnessError;
/// let dir = tempfile::tempdir().expect("temp dir");
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         workdir: Some(dir.path().to_path_buf()),
///         ..RunCommand::default()
///     }),
/// };
/// let err = run_cli(cli).expect_err("no solver in an empty directory");
/// assert!(matches!(err, CliError::Harness(HarnessError::MissingBinary { .. })));
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(&run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(solver = field::Empty, input_dir = field::Empty, threads = field::Empty),
)]
pub(super) fn run_command(command: &RunCommand) -> Result<ExecutionSummary, CliError> {
    let workdir = match &command.workdir {
        Some(dir) => dir.clone(),
        None => env::current_dir().map_err(|source| CliError::Workdir { source })?,
    };
    let config = build_config(command, &workdir)?;

    let span = Span::current();
    span.record("solver", field::display(config.solver().display()));
    span.record("input_dir", field::display(config.input_dir().display()));
    span.record("threads", config.threads().get());

    let summary = Harness::new(config.clone()).run()?;
    info!(
        solved = summary.solved,
        failures = summary.failures(),
        report = %config.report().display(),
        "command completed"
    );
    Ok(ExecutionSummary {
        report: config.report().to_path_buf(),
        summary,
    })
}

/// Folds command-line options over the defaults rooted at `workdir`.
pub(super) fn build_config(
    command: &RunCommand,
    workdir: &Path,
) -> Result<HarnessConfig, HarnessError> {
    let mut builder = HarnessConfigBuilder::new(workdir)
        .with_timeout_secs(
            command
                .timeout_secs
                .unwrap_or(solver::DEFAULT_TIMEOUT.as_secs()),
        )
        .with_threads(
            command
                .threads
                .unwrap_or_else(|| solver::default_thread_hint().get()),
        )
        .with_report_rejected(command.report_rejected);
    if let Some(path) = &command.solver {
        builder = builder.with_solver(path);
    }
    if let Some(path) = &command.input_dir {
        builder = builder.with_input_dir(path);
    }
    if let Some(path) = &command.report {
        builder = builder.with_report(path);
    }
    builder.build()
}

/// Renders `summary` to `writer` as `key: value` lines.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::path::PathBuf;
/// # use editbench_cli::cli::{ExecutionSummary, render_summary};
/// # use editbench_core::RunSummary;
/// let summary = ExecutionSummary {
///     report: PathBuf::from("optimum.csv"),
///     summary: RunSummary { discovered: 2, solved: 1, timed_out: 1, rows: 2, ..RunSummary::default() },
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer).expect("writing to a Vec succeeds");
/// let text = String::from_utf8(buffer).expect("summary is UTF-8");
/// assert!(text.starts_with("report: optimum.csv\ndiscovered: 2\n"));
/// assert!(text.contains("timed out: 1\n"));
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let counts = &summary.summary;
    writeln!(writer, "report: {}", summary.report.display())?;
    for (label, value) in [
        ("discovered", counts.discovered),
        ("skipped", counts.skipped),
        ("solved", counts.solved),
        ("timed out", counts.timed_out),
        ("resource exhausted", counts.resource_exhausted),
        ("solver failed", counts.solver_failed),
        ("empty inputs", counts.empty_inputs),
        ("rejected", counts.rejected),
        ("unreadable outputs", counts.unreadable_outputs),
        ("rows", counts.rows),
    ] {
        writeln!(writer, "{label}: {value}")?;
    }
    Ok(())
}
