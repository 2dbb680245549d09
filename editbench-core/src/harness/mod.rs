//! Job orchestration: discovery, per-job pipeline, and cleanup.
//!
//! Jobs run one at a time in scan order. Each job is parsed and converted,
//! handed to the solver, reconstructed, reported, and cleaned before the next
//! one starts. Per-job failures end up as report rows and diagnostics; only
//! [`HarnessError`] aborts a run.

mod config;
mod discovery;
mod job;

use std::{fs, io, path::Path};

use tracing::{Span, debug, error, field, info, instrument, warn};

pub use config::{
    DEFAULT_INPUT_DIR, DEFAULT_REPORT, DEFAULT_SOLVER, HarnessConfig, HarnessConfigBuilder,
};
pub use discovery::{Candidate, STALE_SUFFIX, discover, sweep};
pub use job::{Job, JobState};

use crate::{
    canonical::{self, CanonicalOutcome},
    error::{ConvertError, HarnessError},
    graph::GraphMetrics,
    reconstruct::{self, Palette},
    report::{JobRecord, ReportWriter},
    solver::{SolverInvoker, SolverRun},
};

/// Suffix of solver outputs swept once all jobs finish.
const SOLVER_OUTPUT_SUFFIX: &str = "gml";

/// Per-outcome job counts for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Inputs found by discovery.
    pub discovered: usize,
    /// Inputs skipped because a solution already existed.
    pub skipped: usize,
    /// Jobs whose solver run completed normally.
    pub solved: usize,
    /// Jobs killed after exceeding the time budget.
    pub timed_out: usize,
    /// Jobs killed by the operating system.
    pub resource_exhausted: usize,
    /// Jobs whose solver exited unsuccessfully.
    pub solver_failed: usize,
    /// Jobs whose canonical input was empty.
    pub empty_inputs: usize,
    /// Inputs rejected by the parser.
    pub rejected: usize,
    /// Solved jobs whose output could not be reconstructed.
    pub unreadable_outputs: usize,
    /// Rows appended to the report.
    pub rows: usize,
    /// Solver outputs removed by the final sweep.
    pub swept: usize,
}

impl RunSummary {
    /// Jobs that ended with an `Err` row or a rejection.
    #[must_use]
    pub const fn failures(&self) -> usize {
        self.timed_out
            + self.resource_exhausted
            + self.solver_failed
            + self.empty_inputs
            + self.rejected
            + self.unreadable_outputs
    }

    const fn count(&mut self, state: JobState) {
        match state {
            JobState::Solved => self.solved += 1,
            JobState::TimedOut => self.timed_out += 1,
            JobState::ResourceExhausted => self.resource_exhausted += 1,
            JobState::SolverFailed => self.solver_failed += 1,
            JobState::EmptyInput => self.empty_inputs += 1,
            JobState::Rejected => self.rejected += 1,
            JobState::Discovered
            | JobState::Converted
            | JobState::Reported
            | JobState::Cleaned => {}
        }
    }
}

/// Drives every discovered input through the pipeline.
///
/// # Examples
/// ```no_run
/// use editbench_core::{Harness, HarnessConfigBuilder};
///
/// let config = HarnessConfigBuilder::new(".").build()?;
/// let summary = Harness::new(config).run()?;
/// println!("{} solved", summary.solved);
/// # Ok::<(), editbench_core::HarnessError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Harness {
    config: HarnessConfig,
    palette: Palette,
}

impl Harness {
    /// Creates a harness for `config` with the default palette.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            palette: Palette::default(),
        }
    }

    /// Overrides the palette used for cluster colors.
    #[must_use]
    pub const fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Processes every input under the configured directory.
    ///
    /// # Errors
    /// Returns [`HarnessError::MissingBinary`] before touching any input when
    /// the solver is absent or is not an executable file, [`HarnessError::UnreadableInputDir`] when the
    /// input directory cannot be scanned, and [`HarnessError::Report`] when a
    /// row cannot be written.
    #[instrument(
        name = "harness.run",
        err,
        skip(self),
        fields(
            input_dir = %self.config.input_dir().display(),
            jobs = field::Empty,
            failures = field::Empty,
        ),
    )]
    pub fn run(&self) -> Result<RunSummary, HarnessError> {
        let solver = self.config.solver();
        if !is_launchable(solver) {
            return Err(HarnessError::MissingBinary {
                path: solver.to_path_buf(),
            });
        }
        let candidates = discover(self.config.input_dir())?;
        let mut report = ReportWriter::open(self.config.report())?;
        let invoker = self.config.invoker();

        let mut summary = RunSummary {
            discovered: candidates.len(),
            ..RunSummary::default()
        };
        Span::current().record("jobs", candidates.len());
        for candidate in candidates {
            let Some(mut job) = Job::new(candidate.path, candidate.format) else {
                continue;
            };
            self.run_job(&mut job, &invoker, &mut report, &mut summary)?;
        }
        summary.swept = sweep(self.config.input_dir(), SOLVER_OUTPUT_SUFFIX)?;

        Span::current().record("failures", summary.failures());
        info!(
            solved = summary.solved,
            skipped = summary.skipped,
            failures = summary.failures(),
            rows = summary.rows,
            "run finished"
        );
        Ok(summary)
    }

    #[instrument(
        name = "harness.job",
        err,
        skip_all,
        fields(job = job.name(), path = %job.source().display(), state = field::Empty),
    )]
    fn run_job(
        &self,
        job: &mut Job,
        invoker: &SolverInvoker,
        report: &mut ReportWriter,
        summary: &mut RunSummary,
    ) -> Result<(), HarnessError> {
        let conversion = match canonical::convert(job.source(), job.format(), job.artifacts()) {
            Ok(conversion) => conversion,
            Err(err) => return self.reject(job, &err, report, summary),
        };
        let initial = conversion.graph.metrics();
        job.set_initial(conversion.graph);
        job.advance(JobState::Converted)?;

        if let CanonicalOutcome::Skipped { solution } = conversion.outcome {
            debug!(solution = %solution.display(), "already solved");
            summary.skipped += 1;
            return clean(job);
        }

        let record = match invoker.invoke(job.artifacts()) {
            Ok(run) => {
                job.advance(JobState::Solved)?;
                summary.count(JobState::Solved);
                self.finish_solved(job, initial, &run, summary)
            }
            Err(err) => {
                let state = JobState::for_solve_error(&err);
                job.advance(state)?;
                summary.count(state);
                error!(
                    job = job.name(),
                    code = %err.code(),
                    error = %err,
                    "solver run failed"
                );
                JobRecord::failed(job.name(), Some(initial))
            }
        };

        report.append(&record)?;
        summary.rows += 1;
        job.advance(JobState::Reported)?;
        clean(job)
    }

    fn finish_solved(
        &self,
        job: &mut Job,
        initial: GraphMetrics,
        run: &SolverRun,
        summary: &mut RunSummary,
    ) -> JobRecord {
        let artifacts = job.artifacts();
        let solution = match reconstruct::reconstruct(&artifacts.solver_output(), self.palette) {
            Ok(solution) => solution,
            Err(err) => {
                summary.unreadable_outputs += 1;
                error!(
                    job = job.name(),
                    code = %err.code(),
                    error = %err,
                    "solver output could not be reconstructed"
                );
                return JobRecord::failed(job.name(), Some(initial));
            }
        };

        if let Err(err) = canonical::write_edge_list(&solution.graph, &artifacts.solution()) {
            warn!(job = job.name(), code = %err.code(), error = %err, "solution edge list not written");
        }
        if let Err(err) = solution
            .assignment
            .write_dump(self.palette, &artifacts.cluster_dump())
        {
            warn!(job = job.name(), code = %err.code(), error = %err, "cluster dump not written");
        }

        let metrics = solution.graph.metrics();
        let record = JobRecord::solved(job.name(), initial, run.elapsed, run.objective(), metrics);
        job.set_solution(solution.graph);
        record
    }

    fn reject(
        &self,
        job: &mut Job,
        err: &ConvertError,
        report: &mut ReportWriter,
        summary: &mut RunSummary,
    ) -> Result<(), HarnessError> {
        let code = match err {
            ConvertError::Parse(parse) => parse.code().as_str(),
            other => other.code().as_str(),
        };
        warn!(job = job.name(), code, error = %err, "input rejected");
        job.advance(JobState::Rejected)?;
        summary.count(JobState::Rejected);
        if self.config.report_rejected() {
            report.append(&JobRecord::failed(job.name(), None))?;
            summary.rows += 1;
            job.advance(JobState::Reported)?;
        }
        clean(job)
    }
}

/// A regular file that, on unix, carries an execute bit.
fn is_launchable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    metadata.is_file() && is_executable(&metadata)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
const fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

fn clean(job: &mut Job) -> Result<(), HarnessError> {
    for path in job.artifacts().transient() {
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "transient artifact removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "transient artifact kept"),
        }
    }
    job.advance(JobState::Cleaned)?;
    Span::current().record("state", "cleaned");
    Ok(())
}

#[cfg(test)]
mod tests;
