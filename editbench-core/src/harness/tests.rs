//! Orchestration tests driving fake solver scripts through whole runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use editbench_test_support::{
    solver::{FAKE_SOLVER_NAME, FakeSolver, write_fake_solver},
    tracing::RecordingLayer,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;
use tracing::Level;

use super::*;

const PATH_GRAPH: &str = "c four vertices on a path\np edge 4 3\n1 2\n2 3\n3 4\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn input(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join("test").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create input dir");
        }
        fs::write(&path, contents).expect("write input");
        path
    }

    fn solver(&self, behaviour: &FakeSolver) {
        write_fake_solver(self.root(), behaviour).expect("write fake solver");
    }

    fn harness(&self) -> Harness {
        self.harness_with(|builder| builder)
    }

    fn harness_with(
        &self,
        adjust: impl FnOnce(HarnessConfigBuilder) -> HarnessConfigBuilder,
    ) -> Harness {
        let builder = HarnessConfigBuilder::new(self.root()).with_threads(3);
        Harness::new(adjust(builder).build().expect("configuration is valid"))
    }

    fn report_lines(&self) -> Vec<String> {
        fs::read_to_string(self.root().join(DEFAULT_REPORT))
            .expect("report exists")
            .lines()
            .map(ToOwned::to_owned)
            .collect()
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join(DEFAULT_INPUT_DIR)).expect("create input dir");
    Workspace { dir }
}

fn no_solver(_root: &Path) {}

fn solver_directory(root: &Path) {
    fs::create_dir_all(root.join(FAKE_SOLVER_NAME)).expect("create directory in place of solver");
}

#[rstest]
#[case::absent(no_solver)]
#[case::directory(solver_directory)]
fn missing_binary_aborts_before_any_job(workspace: Workspace, #[case] place: fn(&Path)) {
    place(workspace.root());
    workspace.input("g.gr", PATH_GRAPH);

    let err = workspace.harness().run().expect_err("solver is absent");

    assert!(matches!(err, HarnessError::MissingBinary { .. }));
    assert!(!workspace.root().join(DEFAULT_REPORT).exists());
    assert!(!workspace.root().join("test/g.sif").exists());
}

#[cfg(unix)]
#[rstest]
fn solver_without_execute_bit_is_missing(workspace: Workspace) {
    use std::os::unix::fs::PermissionsExt;

    let solver = workspace.root().join(FAKE_SOLVER_NAME);
    fs::write(&solver, "#!/bin/sh\nexit 0\n").expect("write solver");
    fs::set_permissions(&solver, fs::Permissions::from_mode(0o644)).expect("clear execute bits");
    workspace.input("g.gr", PATH_GRAPH);

    let err = workspace.harness().run().expect_err("solver cannot be launched");

    assert!(matches!(err, HarnessError::MissingBinary { .. }));
    assert!(!workspace.root().join(DEFAULT_REPORT).exists());
}

#[rstest]
fn missing_input_dir_is_fatal(workspace: Workspace) {
    workspace.solver(&FakeSolver::Exit(0));
    let err = workspace
        .harness_with(|builder| builder.with_input_dir(workspace.root().join("absent")))
        .run()
        .expect_err("input dir is absent");
    assert!(matches!(err, HarnessError::UnreadableInputDir { .. }));
}

#[cfg(unix)]
mod process {
    use super::*;

    use editbench_test_support::solver::{process_is_alive, read_pid};

    #[rstest]
    fn solved_job_is_reported_and_cleaned(workspace: Workspace) {
        workspace.solver(&FakeSolver::solving("2", &[&[1, 2], &[3, 4]]));
        workspace.input("set/g.gr", PATH_GRAPH);

        let summary = workspace.harness().run().expect("run succeeds");

        assert_eq!(summary.solved, 1);
        assert_eq!(summary.rows, 1);
        let lines = workspace.report_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("g,"));
        assert!(lines[1].ends_with(",2,\"G = (4, 3)\",\"G = (4, 2)\",1,2,1"));

        let dir = workspace.root().join("test/set");
        assert_eq!(
            fs::read_to_string(dir.join("g.txt")).expect("solution written"),
            "1 2\n3 4\n"
        );
        assert!(dir.join(".g.json").exists());
        assert!(!dir.join("g.sif").exists());
        assert!(!dir.join("g.gml").exists());

        let args = fs::read_to_string(dir.join("g.args")).expect("solver recorded its arguments");
        assert!(args.contains("-threads\n3\n"));
    }

    #[rstest]
    fn solved_inputs_are_skipped_on_the_next_run(workspace: Workspace) {
        workspace.solver(&FakeSolver::solving("1", &[&[1, 2, 3, 4]]));
        workspace.input("g.gr", PATH_GRAPH);

        workspace.harness().run().expect("first run succeeds");
        let second = workspace.harness().run().expect("second run succeeds");

        assert_eq!(second.skipped, 1);
        assert_eq!(second.rows, 0);
        assert_eq!(workspace.report_lines().len(), 2, "one header and one row");
    }

    #[rstest]
    fn timed_out_job_gets_an_error_row(workspace: Workspace) {
        workspace.solver(&FakeSolver::Hang);
        workspace.input("slow.gr", PATH_GRAPH);
        workspace.input("later.gr", PATH_GRAPH);

        let (result, layer) = RecordingLayer::capture(|| {
            workspace
                .harness_with(|builder| builder.with_timeout_secs(1))
                .run()
        });
        let summary = result.expect("run survives timeouts");

        assert_eq!(summary.timed_out, 2);
        for name in ["slow", "later"] {
            let pid = read_pid(&workspace.root().join("test").join(name))
                .expect("hanging solver recorded its pid");
            assert!(!process_is_alive(pid), "solver for {name} survived the timeout");
        }
        let lines = workspace.report_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1..].iter().all(|line| line.contains(",Err,Err,\"G = (4, 3)\",Err,1,Err,Err")));
        assert!(!workspace.root().join("test/slow.sif").exists());

        let events = layer.events_with("code", "SOLVER_TIMEOUT");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.level == Level::ERROR));
    }

    #[rstest]
    #[case::oom(FakeSolver::KilledByOs, "SOLVER_RESOURCE_EXHAUSTED")]
    #[case::exit(FakeSolver::Exit(2), "SOLVER_FAILED")]
    #[case::no_output(FakeSolver::SolveWithoutOutput, "RECONSTRUCT_IO")]
    fn failed_runs_are_reported_with_codes(
        workspace: Workspace,
        #[case] behaviour: FakeSolver,
        #[case] code: &str,
    ) {
        workspace.solver(&behaviour);
        workspace.input("g.gr", PATH_GRAPH);

        let (result, layer) = RecordingLayer::capture(|| workspace.harness().run());
        let summary = result.expect("run survives solver failures");

        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.rows, 1);
        assert_eq!(layer.events_with("code", code).len(), 1);
        assert!(workspace.report_lines()[1].starts_with("g,Err,Err,"));
        assert!(!workspace.root().join("test/g.txt").exists());
    }

    #[rstest]
    fn empty_input_is_removed_and_reported(workspace: Workspace) {
        workspace.solver(&FakeSolver::Hang);
        workspace.input("empty.gr", "p edge 3 0\n");

        let summary = workspace.harness().run().expect("run succeeds");

        assert_eq!(summary.empty_inputs, 1);
        assert_eq!(
            workspace.report_lines()[1],
            "empty,Err,Err,\"G = (0, 0)\",Err,0,Err,Err"
        );
        assert!(!workspace.root().join("test/empty.sif").exists());
    }

    #[rstest]
    #[case::quiet(false, 1)]
    #[case::reported(true, 2)]
    fn rejected_inputs_stay_in_place(
        workspace: Workspace,
        #[case] report_rejected: bool,
        #[case] expected_lines: usize,
    ) {
        workspace.solver(&FakeSolver::Exit(0));
        let source = workspace.input("bad.gr", "p edge 3 3\n1 2\n2 3\n3 4\n");

        let (result, layer) = RecordingLayer::capture(|| {
            workspace
                .harness_with(|builder| builder.with_report_rejected(report_rejected))
                .run()
        });
        let summary = result.expect("run survives rejections");

        assert_eq!(summary.rejected, 1);
        assert!(source.exists());
        assert!(!workspace.root().join("test/bad.sif").exists());
        assert_eq!(workspace.report_lines().len(), expected_lines);
        assert_eq!(layer.events_with("code", "PARSE_METADATA_MISMATCH").len(), 1);
    }

    #[rstest]
    fn stale_artifacts_are_swept(workspace: Workspace) {
        workspace.solver(&FakeSolver::Exit(0));
        let stale = workspace.input("old/x.td", "");
        let leftover = workspace.input("old/y.gml", "graph [ ]\n");

        let summary = workspace.harness().run().expect("run succeeds");

        assert!(!stale.exists());
        assert!(!leftover.exists());
        assert_eq!(summary.swept, 1);
        assert_eq!(summary.discovered, 0);
    }

    #[rstest]
    fn job_spans_end_in_cleaned_state(workspace: Workspace) {
        workspace.solver(&FakeSolver::solving("0", &[&[1, 2]]));
        workspace.input("pair.graph6", "A_\n");

        let (result, layer) = RecordingLayer::capture(|| workspace.harness().run());
        result.expect("run succeeds");

        let jobs = layer.spans_named("harness.job");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].field("job"), Some("pair"));
        assert_eq!(jobs[0].field("state"), Some("cleaned"));
        assert_eq!(layer.spans_named("solver.invoke").len(), 1);
    }
}
