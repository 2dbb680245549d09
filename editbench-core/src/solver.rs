//! Invocation of the external cluster-editing solver.
//!
//! The solver runs as a child process with a fixed flag contract:
//! `<solver> -f <input> -F 1 -O 2 -v 1 -threads <N> -o <output-base>`.
//! The harness blocks until the process exits or the time budget runs out;
//! the child is always reaped, including on early returns.

use std::{
    fs,
    io::{self, Read},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    process::{Child, ChildStdout, Command, ExitStatus, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use tracing::{Span, debug, field, instrument, warn};

use crate::{artifacts::JobArtifacts, error::SolveError};

/// Time budget granted to a single solver run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Logical CPUs left for the harness and the operating system.
pub const RESERVED_CPUS: usize = 2;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

// The kernel's OOM killer terminates with SIGKILL.
#[cfg(unix)]
const OOM_KILL_SIGNAL: i32 = 9;

/// Thread hint for a machine with `logical_cpus` CPUs: `max(1, cpus - 2)`.
///
/// # Examples
/// ```
/// use editbench_core::solver::thread_hint;
///
/// assert_eq!(thread_hint(16).get(), 14);
/// assert_eq!(thread_hint(2).get(), 1);
/// assert_eq!(thread_hint(0).get(), 1);
/// ```
#[must_use]
pub fn thread_hint(logical_cpus: usize) -> NonZeroUsize {
    NonZeroUsize::new(logical_cpus.saturating_sub(RESERVED_CPUS)).unwrap_or(NonZeroUsize::MIN)
}

/// Thread hint for the current machine.
#[must_use]
pub fn default_thread_hint() -> NonZeroUsize {
    let cpus = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    thread_hint(cpus)
}

/// Output of a solver run that exited successfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverRun {
    /// Wall-clock time between spawn and exit.
    pub elapsed: Duration,
    /// Everything the solver printed on standard output.
    pub stdout: String,
}

impl SolverRun {
    /// The solver's self-reported objective value, trimmed.
    #[must_use]
    pub fn objective(&self) -> &str {
        self.stdout.trim()
    }
}

/// Launches the solver binary for canonical inputs.
///
/// # Examples
/// ```
/// use std::{num::NonZeroUsize, time::Duration};
/// use editbench_core::solver::SolverInvoker;
///
/// let invoker = SolverInvoker::new("./yoshiko")
///     .with_threads(NonZeroUsize::new(4).expect("non-zero"))
///     .with_timeout(Duration::from_secs(60));
/// assert_eq!(invoker.threads().get(), 4);
/// assert_eq!(invoker.timeout(), Duration::from_secs(60));
/// ```
#[derive(Clone, Debug)]
pub struct SolverInvoker {
    binary: PathBuf,
    threads: NonZeroUsize,
    timeout: Duration,
}

impl SolverInvoker {
    /// Creates an invoker for `binary` with the machine's thread hint and the default budget.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            threads: default_thread_hint(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the `-threads` hint.
    #[must_use]
    pub const fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.threads = threads;
        self
    }

    /// Overrides the time budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the solver executable.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Thread hint passed via `-threads`.
    #[must_use]
    pub const fn threads(&self) -> NonZeroUsize {
        self.threads
    }

    /// Time budget after which the solver is killed.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the solver command line for `input`, writing under `output_base`.
    #[must_use]
    pub fn command(&self, input: &Path, output_base: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-f")
            .arg(input)
            .args(["-F", "1", "-O", "2", "-v", "1", "-threads"])
            .arg(self.threads.to_string())
            .arg("-o")
            .arg(output_base);
        command
    }

    /// Runs the solver on the canonical input of `artifacts`.
    ///
    /// # Errors
    /// See [`SolverInvoker::invoke_paths`].
    pub fn invoke(&self, artifacts: &JobArtifacts) -> Result<SolverRun, SolveError> {
        self.invoke_paths(&artifacts.canonical_input(), &artifacts.output_base())
    }

    /// Runs the solver on `input`, blocking until it exits or the budget elapses.
    ///
    /// Zero-byte inputs are deleted without launching the solver.
    ///
    /// # Errors
    /// Returns [`SolveError::EmptyInput`] for empty inputs,
    /// [`SolveError::Inspect`] when the input cannot be examined,
    /// [`SolveError::Timeout`] when the budget elapses before the process exits
    /// (it is killed) or before its standard output closes,
    /// [`SolveError::ResourceExhausted`] when the operating system killed the
    /// process, [`SolveError::Failed`] for any other unsuccessful exit, and
    /// I/O variants when the process cannot be managed.
    #[instrument(
        name = "solver.invoke",
        skip(self, input, output_base),
        fields(
            input = %input.display(),
            threads = self.threads.get(),
            timeout_secs = self.timeout.as_secs(),
            elapsed_ms = field::Empty,
        ),
    )]
    pub fn invoke_paths(&self, input: &Path, output_base: &Path) -> Result<SolverRun, SolveError> {
        reject_empty(input)?;

        let mut command = self.command(input, output_base);
        command.stdin(Stdio::null()).stdout(Stdio::piped());
        let child = command.spawn().map_err(|source| SolveError::Spawn {
            path: input.to_path_buf(),
            source,
        })?;
        let mut guard = ReapOnDrop::new(child);
        let output = guard.take_stdout().map(spawn_reader);

        let start = Instant::now();
        let status = loop {
            if let Some(status) = guard.try_wait().map_err(|source| SolveError::Wait { source })? {
                break status;
            }
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                guard.kill().map_err(|source| SolveError::Wait { source })?;
                Span::current().record("elapsed_ms", elapsed_millis(elapsed));
                // The reader is abandoned: descendants of the solver may still hold the pipe.
                return Err(SolveError::Timeout { elapsed });
            }
            thread::sleep(POLL_INTERVAL.min(self.timeout - elapsed));
        };
        let elapsed = start.elapsed();
        Span::current().record("elapsed_ms", elapsed_millis(elapsed));

        classify(status)?;
        let stdout = match output {
            Some(receiver) => self.await_output(&receiver, start)?,
            None => String::new(),
        };
        debug!(objective = stdout.trim(), "solver finished");
        Ok(SolverRun { elapsed, stdout })
    }

    /// Waits for the reader within what is left of the budget.
    fn await_output(
        &self,
        receiver: &Receiver<io::Result<String>>,
        start: Instant,
    ) -> Result<String, SolveError> {
        let remaining = self.timeout.saturating_sub(start.elapsed());
        match receiver.recv_timeout(remaining) {
            Ok(read) => read.map_err(|source| SolveError::Output { source }),
            // The solver exited but something it started still holds stdout.
            Err(RecvTimeoutError::Timeout) => {
                let elapsed = start.elapsed();
                Span::current().record("elapsed_ms", elapsed_millis(elapsed));
                Err(SolveError::Timeout { elapsed })
            }
            Err(RecvTimeoutError::Disconnected) => Err(SolveError::Output {
                source: io::Error::other("solver output reader stopped"),
            }),
        }
    }
}

fn reject_empty(input: &Path) -> Result<(), SolveError> {
    let metadata = fs::metadata(input).map_err(|source| SolveError::Inspect {
        path: input.to_path_buf(),
        source,
    })?;
    if metadata.len() > 0 {
        return Ok(());
    }
    if let Err(err) = fs::remove_file(input) {
        warn!(path = %input.display(), error = %err, "failed to remove empty canonical input");
    }
    Err(SolveError::EmptyInput {
        path: input.to_path_buf(),
    })
}

fn classify(status: ExitStatus) -> Result<(), SolveError> {
    if status.success() {
        return Ok(());
    }
    if killed_by_oom(status) {
        return Err(SolveError::ResourceExhausted);
    }
    Err(SolveError::Failed { status })
}

// Best effort: any external SIGKILL is attributed to memory exhaustion.
#[cfg(unix)]
fn killed_by_oom(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(OOM_KILL_SIGNAL)
}

#[cfg(not(unix))]
fn killed_by_oom(_status: ExitStatus) -> bool {
    false
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn spawn_reader(mut stdout: ChildStdout) -> Receiver<io::Result<String>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = String::new();
        let read = stdout.read_to_string(&mut buffer).map(|_| buffer);
        if sender.send(read).is_err() {
            debug!("solver output discarded after the time budget ran out");
        }
    });
    receiver
}

/// Owns the child process and kills and reaps it if dropped before exit.
struct ReapOnDrop {
    child: Child,
    reaped: bool,
}

impl ReapOnDrop {
    const fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        self.reaped = status.is_some();
        Ok(status)
    }

    fn kill(&mut self) -> io::Result<ExitStatus> {
        match self.child.kill() {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => {}
            Err(err) => return Err(err),
        }
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ReapOnDrop {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(err) = self.kill() {
            warn!(error = %err, "failed to reap solver process");
        }
    }
}
