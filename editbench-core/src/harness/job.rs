//! Per-file job state and its forward-only lifecycle.

use std::path::{Path, PathBuf};

use crate::{
    artifacts::JobArtifacts,
    error::{HarnessError, SolveError},
    format::InputFormat,
    graph::Graph,
};

/// Lifecycle position of a [`Job`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Matched a recognised suffix during the scan.
    Discovered,
    /// Canonical input written, or skipped because a solution exists.
    Converted,
    /// The solver exited normally.
    Solved,
    /// The solver exceeded its time budget.
    TimedOut,
    /// The operating system killed the solver.
    ResourceExhausted,
    /// The solver exited unsuccessfully or could not be managed.
    SolverFailed,
    /// The canonical input was empty and removed.
    EmptyInput,
    /// The source failed validation.
    Rejected,
    /// A report row was appended.
    Reported,
    /// Transient artifacts removed and graphs released.
    Cleaned,
}

impl JobState {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        use JobState::{
            Cleaned, Converted, Discovered, EmptyInput, Rejected, Reported, ResourceExhausted,
            Solved, SolverFailed, TimedOut,
        };
        matches!(
            (self, next),
            (Discovered, Converted | Rejected)
                | (
                    Converted,
                    Solved | TimedOut | ResourceExhausted | SolverFailed | EmptyInput | Cleaned
                )
                | (
                    Solved | TimedOut | ResourceExhausted | SolverFailed | EmptyInput,
                    Reported
                )
                | (Rejected, Reported | Cleaned)
                | (Reported, Cleaned)
        )
    }

    /// State reached when the solver fails with `err`.
    #[must_use]
    pub const fn for_solve_error(err: &SolveError) -> Self {
        match err {
            SolveError::EmptyInput { .. } => Self::EmptyInput,
            SolveError::Timeout { .. } => Self::TimedOut,
            SolveError::ResourceExhausted => Self::ResourceExhausted,
            _ => Self::SolverFailed,
        }
    }
}

/// One input file moving through the pipeline.
///
/// The job owns its parsed graphs; both are released when it is cleaned.
#[derive(Debug)]
pub struct Job {
    source: PathBuf,
    format: InputFormat,
    artifacts: JobArtifacts,
    state: JobState,
    initial: Option<Graph>,
    solution: Option<Graph>,
}

impl Job {
    /// Creates a discovered job, or `None` when `source` has no file name.
    #[must_use]
    pub fn new(source: PathBuf, format: InputFormat) -> Option<Self> {
        let artifacts = JobArtifacts::for_source(&source)?;
        Some(Self {
            source,
            format,
            artifacts,
            state: JobState::Discovered,
            initial: None,
            solution: None,
        })
    }

    /// Source file.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Source format.
    #[must_use]
    pub const fn format(&self) -> InputFormat {
        self.format
    }

    /// Derived artifact paths.
    #[must_use]
    pub const fn artifacts(&self) -> &JobArtifacts {
        &self.artifacts
    }

    /// Base name used in logs and the report.
    #[must_use]
    pub fn name(&self) -> &str {
        self.artifacts.name()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Parsed input graph, once converted.
    #[must_use]
    pub const fn initial(&self) -> Option<&Graph> {
        self.initial.as_ref()
    }

    /// Reconstructed solution graph, once solved.
    #[must_use]
    pub const fn solution(&self) -> Option<&Graph> {
        self.solution.as_ref()
    }

    /// Stores the parsed input graph.
    pub fn set_initial(&mut self, graph: Graph) {
        self.initial = Some(graph);
    }

    /// Stores the reconstructed solution graph.
    pub fn set_solution(&mut self, graph: Graph) {
        self.solution = Some(graph);
    }

    /// Moves to `next`; entering [`JobState::Cleaned`] releases both graphs.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidTransition`] when `next` does not follow
    /// the current state.
    pub fn advance(&mut self, next: JobState) -> Result<(), HarnessError> {
        if !self.state.can_advance_to(next) {
            return Err(HarnessError::InvalidTransition {
                job: self.name().to_owned(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        if next == JobState::Cleaned {
            self.initial = None;
            self.solution = None;
        }
        Ok(())
    }
}
