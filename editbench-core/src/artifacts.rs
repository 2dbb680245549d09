//! Names of the files derived from one input graph.
//!
//! Every artifact lives next to its source file and is keyed by the source's
//! base name: the file name up to its first `.`.

use std::path::{Path, PathBuf};

const CANONICAL_SUFFIX: &str = "sif";
const SOLVER_OUTPUT_SUFFIX: &str = "gml";
const SOLUTION_SUFFIX: &str = "txt";
const CLUSTER_DUMP_SUFFIX: &str = "json";

/// Paths of every file the pipeline reads or writes for one source.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use editbench_core::JobArtifacts;
///
/// let artifacts = JobArtifacts::for_source(Path::new("test/set/karate.v2.gr"))
///     .expect("source has a file name");
/// assert_eq!(artifacts.name(), "karate");
/// assert_eq!(artifacts.canonical_input(), Path::new("test/set/karate.sif"));
/// assert_eq!(artifacts.solution(), Path::new("test/set/karate.txt"));
/// assert_eq!(artifacts.cluster_dump(), Path::new("test/set/.karate.json"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobArtifacts {
    dir: PathBuf,
    name: String,
}

impl JobArtifacts {
    /// Derives the artifact set for `source`, or `None` when it has no file name.
    #[must_use]
    pub fn for_source(source: &Path) -> Option<Self> {
        let file_name = source.file_name()?.to_str()?;
        let name = file_name
            .split('.')
            .next()
            .filter(|stem| !stem.is_empty())
            .or_else(|| source.file_stem().and_then(|stem| stem.to_str()))?;
        let dir = source
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);
        Some(Self {
            dir,
            name: name.to_owned(),
        })
    }

    /// Base name shared by all artifacts; also the report's job name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the source and every derived artifact.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Solver input in the canonical `<u> xx <v>` form.
    #[must_use]
    pub fn canonical_input(&self) -> PathBuf {
        self.with_suffix(CANONICAL_SUFFIX)
    }

    /// Base path passed to the solver's `-o` flag.
    #[must_use]
    pub fn output_base(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Cluster description the solver writes next to its output base.
    #[must_use]
    pub fn solver_output(&self) -> PathBuf {
        self.with_suffix(SOLVER_OUTPUT_SUFFIX)
    }

    /// Solution edge list; its presence marks the experiment as solved.
    #[must_use]
    pub fn solution(&self) -> PathBuf {
        self.with_suffix(SOLUTION_SUFFIX)
    }

    /// Hidden JSON dump of clusters and colors for plotting.
    #[must_use]
    pub fn cluster_dump(&self) -> PathBuf {
        self.dir
            .join(format!(".{}.{CLUSTER_DUMP_SUFFIX}", self.name))
    }

    /// Artifacts removed once a job has been reported.
    #[must_use]
    pub fn transient(&self) -> [PathBuf; 2] {
        [self.canonical_input(), self.solver_output()]
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{suffix}", self.name))
    }
}
