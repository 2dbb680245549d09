//! End-to-end tests driving the `editbench` binary.

use std::{fs, path::Path, process::Command};

use tempfile::TempDir;

fn editbench(workdir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_editbench"));
    command
        .arg("run")
        .arg("--workdir")
        .arg(workdir)
        .env("RUST_LOG", "warn")
        .env_remove("EDITBENCH_LOG_FORMAT");
    command
}

#[test]
fn missing_solver_fails_before_writing_the_report() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("test")).expect("create input dir");

    let output = editbench(dir.path()).output().expect("binary runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("HARNESS_MISSING_BINARY"), "stderr: {stderr}");
    assert!(!dir.path().join("optimum.csv").exists());
}

#[test]
fn unsupported_log_format_is_refused() {
    let dir = TempDir::new().expect("temp dir");
    let output = editbench(dir.path())
        .env("EDITBENCH_LOG_FORMAT", "xml")
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported log format"));
}

#[cfg(unix)]
mod with_fake_solver {
    use super::*;

    use editbench_test_support::solver::{FakeSolver, write_fake_solver};

    #[test]
    fn full_run_writes_report_and_summary() {
        let dir = TempDir::new().expect("temp dir");
        let inputs = dir.path().join("test");
        fs::create_dir_all(&inputs).expect("create input dir");
        fs::write(inputs.join("path.gr"), "p edge 4 3\n1 2\n2 3\n3 4\n").expect("write input");
        fs::write(inputs.join("bad.gr"), "p edge 1 1\n1 2\n").expect("write input");
        write_fake_solver(dir.path(), &FakeSolver::solving("2", &[&[1, 2], &[3, 4]]))
            .expect("write fake solver");

        let output = editbench(dir.path())
            .args(["--threads", "1", "--timeout-secs", "30"])
            .output()
            .expect("binary runs");

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("solved: 1\n"));
        assert!(stdout.contains("rejected: 1\n"));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("PARSE_METADATA_MISMATCH"));

        let report = fs::read_to_string(dir.path().join("optimum.csv")).expect("report written");
        assert_eq!(report.lines().count(), 2);
        assert!(inputs.join("path.txt").exists());
    }

    #[test]
    fn json_logs_go_to_stderr() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("test")).expect("create input dir");
        write_fake_solver(dir.path(), &FakeSolver::Exit(0)).expect("write fake solver");

        let output = editbench(dir.path())
            .env("EDITBENCH_LOG_FORMAT", "json")
            .env("RUST_LOG", "info")
            .output()
            .expect("binary runs");

        assert!(output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.lines().any(|line| line.starts_with('{') && line.contains("run finished")));
        assert!(String::from_utf8_lossy(&output.stdout).starts_with("report: "));
    }
}
