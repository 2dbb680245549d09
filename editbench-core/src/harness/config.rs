//! Run configuration and its builder.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::HarnessError,
    solver::{self, SolverInvoker},
};

/// Solver executable name inside the working directory.
pub const DEFAULT_SOLVER: &str = "yoshiko";
/// Input directory name inside the working directory.
pub const DEFAULT_INPUT_DIR: &str = "test";
/// Report file name inside the working directory.
pub const DEFAULT_REPORT: &str = "optimum.csv";

/// Validated settings for one harness run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    solver: PathBuf,
    input_dir: PathBuf,
    report: PathBuf,
    timeout: Duration,
    threads: NonZeroUsize,
    report_rejected: bool,
}

impl HarnessConfig {
    /// Solver executable.
    #[must_use]
    pub fn solver(&self) -> &Path {
        &self.solver
    }

    /// Directory scanned recursively for inputs.
    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Report file rows are appended to.
    #[must_use]
    pub fn report(&self) -> &Path {
        &self.report
    }

    /// Per-job solver time budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Thread hint handed to the solver.
    #[must_use]
    pub const fn threads(&self) -> NonZeroUsize {
        self.threads
    }

    /// Whether rejected inputs get an `Err` report row.
    #[must_use]
    pub const fn report_rejected(&self) -> bool {
        self.report_rejected
    }

    /// Invoker configured with this run's solver, threads, and budget.
    #[must_use]
    pub fn invoker(&self) -> SolverInvoker {
        SolverInvoker::new(&self.solver)
            .with_threads(self.threads)
            .with_timeout(self.timeout)
    }
}

/// Builds a [`HarnessConfig`] rooted at a working directory.
///
/// Paths left unset default to `<workdir>/yoshiko`, `<workdir>/test`, and
/// `<workdir>/optimum.csv`.
///
/// # Examples
/// ```
/// use std::{path::Path, time::Duration};
/// use editbench_core::HarnessConfigBuilder;
///
/// let config = HarnessConfigBuilder::new("/work")
///     .with_timeout_secs(60)
///     .with_threads(2)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(config.solver(), Path::new("/work/yoshiko"));
/// assert_eq!(config.input_dir(), Path::new("/work/test"));
/// assert_eq!(config.timeout(), Duration::from_secs(60));
/// assert_eq!(config.threads().get(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct HarnessConfigBuilder {
    workdir: PathBuf,
    solver: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    report: Option<PathBuf>,
    timeout_secs: u64,
    threads: usize,
    report_rejected: bool,
}

impl HarnessConfigBuilder {
    /// Starts from defaults rooted at `workdir`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            solver: None,
            input_dir: None,
            report: None,
            timeout_secs: solver::DEFAULT_TIMEOUT.as_secs(),
            threads: solver::default_thread_hint().get(),
            report_rejected: false,
        }
    }

    /// Overrides the solver executable.
    #[must_use]
    pub fn with_solver(mut self, path: impl Into<PathBuf>) -> Self {
        self.solver = Some(path.into());
        self
    }

    /// Overrides the input directory.
    #[must_use]
    pub fn with_input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Overrides the report file.
    #[must_use]
    pub fn with_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report = Some(path.into());
        self
    }

    /// Sets the per-job time budget in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the solver thread hint.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enables `Err` rows for rejected inputs.
    #[must_use]
    pub const fn with_report_rejected(mut self, enabled: bool) -> Self {
        self.report_rejected = enabled;
        self
    }

    /// Validates the settings and resolves default paths.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidConfig`] when the timeout or thread
    /// count is zero.
    pub fn build(self) -> Result<HarnessConfig, HarnessError> {
        if self.timeout_secs == 0 {
            return Err(HarnessError::InvalidConfig {
                field: "timeout_secs",
            });
        }
        let threads =
            NonZeroUsize::new(self.threads).ok_or(HarnessError::InvalidConfig { field: "threads" })?;
        let workdir = self.workdir;
        Ok(HarnessConfig {
            solver: self
                .solver
                .unwrap_or_else(|| workdir.join(DEFAULT_SOLVER)),
            input_dir: self
                .input_dir
                .unwrap_or_else(|| workdir.join(DEFAULT_INPUT_DIR)),
            report: self
                .report
                .unwrap_or_else(|| workdir.join(DEFAULT_REPORT)),
            timeout: Duration::from_secs(self.timeout_secs),
            threads,
            report_rejected: self.report_rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn defaults_follow_working_directory_contract() {
        let config = HarnessConfigBuilder::new("/w").build().expect("defaults are valid");
        assert_eq!(config.report(), Path::new("/w/optimum.csv"));
        assert_eq!(config.timeout(), Duration::from_secs(1800));
        assert!(!config.report_rejected());
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = HarnessConfigBuilder::new("/w")
            .with_solver("/opt/solver")
            .with_input_dir("/data")
            .with_report("/tmp/r.csv")
            .with_report_rejected(true)
            .build()
            .expect("overrides are valid");
        assert_eq!(config.solver(), Path::new("/opt/solver"));
        assert_eq!(config.input_dir(), Path::new("/data"));
        assert_eq!(config.report(), Path::new("/tmp/r.csv"));
        assert!(config.report_rejected());
        assert_eq!(config.invoker().binary(), Path::new("/opt/solver"));
    }

    #[rstest]
    #[case::timeout(HarnessConfigBuilder::new("/w").with_timeout_secs(0), "timeout_secs")]
    #[case::threads(HarnessConfigBuilder::new("/w").with_threads(0), "threads")]
    fn zero_values_are_rejected(#[case] builder: HarnessConfigBuilder, #[case] expected: &str) {
        let err = builder.build().expect_err("zero must be rejected");
        assert!(matches!(err, HarnessError::InvalidConfig { field } if field == expected));
    }
}
