//! Shell-script stand-ins for the external solver.
//!
//! Scripts receive the real flag contract
//! (`-f <input> -F 1 -O 2 -v 1 -threads <N> -o <base>`), so `$2` is the input
//! and `${12}` the output base.

use std::{
    ffi::OsString,
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

/// File name used for fake solvers, matching the harness default.
pub const FAKE_SOLVER_NAME: &str = "yoshiko";

/// What a fake solver does when launched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FakeSolver {
    /// Writes `<base>.gml` and `<base>.args`, then prints `objective`.
    Solve {
        /// Value printed on standard output.
        objective: String,
        /// GML written next to the output base.
        gml: String,
    },
    /// Exits successfully without writing any output file.
    SolveWithoutOutput,
    /// Writes its pid to `<base>.pid`, then sleeps far beyond any test timeout.
    Hang,
    /// Prints an objective and exits while a background child keeps stdout open.
    LeaveStdoutOpen,
    /// Sends itself `SIGKILL`, as the kernel's OOM killer would.
    KilledByOs,
    /// Exits with the given status.
    Exit(i32),
}

impl FakeSolver {
    /// A solver reporting `objective` and assigning cluster `i` to `clusters[i]`.
    ///
    /// # Examples
    /// ```
    /// use editbench_test_support::solver::FakeSolver;
    ///
    /// let FakeSolver::Solve { gml, .. } = FakeSolver::solving("3", &[&[1, 2], &[3]]) else {
    ///     unreachable!("solving builds a Solve variant");
    /// };
    /// assert!(gml.contains("node [ id 2 label \"3\" cluster 1 ]"));
    /// ```
    #[must_use]
    pub fn solving(objective: &str, clusters: &[&[u64]]) -> Self {
        Self::Solve {
            objective: objective.to_owned(),
            gml: gml_for(clusters),
        }
    }

    fn body(&self) -> String {
        match self {
            Self::Solve { objective, gml } => format!(
                "base=\"${{12}}\"\nprintf '%s\\n' \"$@\" > \"$base.args\"\n\
                 cat > \"$base.gml\" <<'GML'\n{gml}GML\nprintf '%s\\n' '{objective}'\n"
            ),
            Self::SolveWithoutOutput => "exit 0\n".to_owned(),
            Self::Hang => "printf '%s\\n' \"$$\" > \"${12}.pid\"\nexec sleep 600\n".to_owned(),
            Self::LeaveStdoutOpen => "sleep 10 &\nprintf '%s\\n' '3'\n".to_owned(),
            Self::KilledByOs => "kill -9 $$\n".to_owned(),
            Self::Exit(code) => format!("exit {code}\n"),
        }
    }
}

/// Renders GML in the layout the solver writes: `node [ id i label "v" cluster c ]`.
#[must_use]
pub fn gml_for(clusters: &[&[u64]]) -> String {
    let mut gml = String::from("graph [\n");
    let mut id = 0usize;
    for (cluster, members) in clusters.iter().enumerate() {
        for vertex in *members {
            let _ = writeln!(gml, "  node [ id {id} label \"{vertex}\" cluster {cluster} ]");
            id += 1;
        }
    }
    gml.push_str("]\n");
    gml
}

/// Writes an executable fake solver named [`FAKE_SOLVER_NAME`] into `dir`.
///
/// # Errors
/// Returns any I/O error raised while writing the script or changing its
/// permissions.
pub fn write_fake_solver(dir: &Path, behaviour: &FakeSolver) -> io::Result<PathBuf> {
    let path = dir.join(FAKE_SOLVER_NAME);
    fs::write(&path, format!("#!/bin/sh\n{}", behaviour.body()))?;
    make_executable(&path)?;
    Ok(path)
}

/// Pid file written by [`FakeSolver::Hang`] next to `output_base`.
#[must_use]
pub fn pid_file(output_base: &Path) -> PathBuf {
    let mut name = OsString::from(output_base.as_os_str());
    name.push(".pid");
    PathBuf::from(name)
}

/// Reads the pid recorded by a [`FakeSolver::Hang`] run.
///
/// # Errors
/// Returns an I/O error when the pid file is missing or does not hold a pid.
pub fn read_pid(output_base: &Path) -> io::Result<u32> {
    fs::read_to_string(pid_file(output_base))?
        .trim()
        .parse()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Whether a process with `pid` still exists (zombies included).
#[cfg(unix)]
#[must_use]
pub fn process_is_alive(pid: u32) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -0 {pid} 2>/dev/null"))
        .status()
        .is_ok_and(|status| status.success())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
