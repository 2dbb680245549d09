//! Conversion of parsed graphs into the solver's `<u> xx <v>` input form.
//!
//! Conversion is idempotent with respect to solved experiments: when the
//! solution edge list for a base name exists, nothing is written.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{Span, debug, field, instrument};

use crate::{
    artifacts::JobArtifacts,
    error::ConvertError,
    format::{self, InputFormat},
    graph::Graph,
};

/// Literal middle token required by the solver's input lines.
pub const SEPARATOR: &str = "xx";

/// What the writer did with a parsed graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanonicalOutcome {
    /// The canonical input was written with `edges` lines.
    Written {
        /// Canonical input path.
        path: PathBuf,
        /// Number of edge lines written.
        edges: usize,
    },
    /// A solution already exists, so the input was left untouched.
    Skipped {
        /// Existing solution artifact.
        solution: PathBuf,
    },
}

/// Parsed graph plus the result of emitting its canonical form.
#[derive(Clone, Debug)]
pub struct Conversion {
    /// Graph parsed from the source file.
    pub graph: Graph,
    /// Whether the canonical input was written or skipped.
    pub outcome: CanonicalOutcome,
}

/// Streams `graph` as `<u> xx <v>` lines into `writer`.
///
/// # Errors
/// Returns any [`io::Error`] raised by the writer.
///
/// # Examples
/// ```
/// use editbench_core::{Graph, canonical::write_edges};
///
/// let mut graph = Graph::new();
/// graph.add_edge(2, 1);
/// graph.add_edge(2, 3);
/// let mut out = Vec::new();
/// write_edges(&graph, &mut out)?;
/// assert_eq!(String::from_utf8_lossy(&out), "1 xx 2\n2 xx 3\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn write_edges(graph: &Graph, mut writer: impl Write) -> io::Result<()> {
    for edge in graph.edges() {
        let (u, v) = edge.endpoints();
        writeln!(writer, "{u} {SEPARATOR} {v}")?;
    }
    writer.flush()
}

/// Writes the canonical input for `graph` unless a solution already exists.
///
/// # Errors
/// Returns [`ConvertError::Io`] if the canonical file cannot be written.
#[instrument(
    name = "canonical.write",
    err,
    skip(graph, artifacts),
    fields(job = artifacts.name(), skipped = field::Empty),
)]
pub fn write_canonical(
    graph: &Graph,
    artifacts: &JobArtifacts,
) -> Result<CanonicalOutcome, ConvertError> {
    let solution = artifacts.solution();
    if solution.exists() {
        Span::current().record("skipped", true);
        debug!(solution = %solution.display(), "solution exists, conversion skipped");
        return Ok(CanonicalOutcome::Skipped { solution });
    }
    Span::current().record("skipped", false);

    let path = artifacts.canonical_input();
    create_and_write(&path, |writer| write_edges(graph, writer))?;
    Ok(CanonicalOutcome::Written {
        path,
        edges: graph.edge_count(),
    })
}

/// Parses `source` and emits its canonical form in one pass.
///
/// # Errors
/// Returns [`ConvertError::Parse`] when the source is rejected and
/// [`ConvertError::Io`] when writing fails. A rejected source never produces a
/// canonical file.
#[instrument(
    name = "canonical.convert",
    err,
    skip(source, artifacts),
    fields(path = %source.display(), job = artifacts.name()),
)]
pub fn convert(
    source: &Path,
    format: InputFormat,
    artifacts: &JobArtifacts,
) -> Result<Conversion, ConvertError> {
    let graph = format::parse_file(source, format)?;
    let outcome = write_canonical(&graph, artifacts)?;
    Ok(Conversion { graph, outcome })
}

/// Writes `graph` as a plain `u v` edge list, the terminal solution artifact.
///
/// # Errors
/// Returns [`ConvertError::Io`] if the file cannot be written.
pub fn write_edge_list(graph: &Graph, path: &Path) -> Result<(), ConvertError> {
    create_and_write(path, |writer| {
        for edge in graph.edges() {
            let (u, v) = edge.endpoints();
            writeln!(writer, "{u} {v}")?;
        }
        writer.flush()
    })
}

fn create_and_write(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), ConvertError> {
    let wrap = |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(wrap)?;
    let mut writer = BufWriter::new(file);
    body(&mut writer).map_err(wrap)
}
