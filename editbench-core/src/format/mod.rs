//! Graph source formats recognised during discovery.
//!
//! Two formats are supported: header-annotated edge lists (`.gr`) whose body
//! is validated against the declared counts, and graph6 (`.graph6`) whose
//! vertices are shifted to 1-based identifiers.

mod graph6;
mod header;

use std::{fs, path::Path};

use tracing::{Span, field, instrument};

pub use header::GraphDescriptor;

use crate::{error::ParseError, graph::Graph};

/// Source format of a discovered input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputFormat {
    /// Comment lines, one `p <name> <V> <E>` header and `<u> <v>` edge lines.
    HeaderEdgeList,
    /// One graph6 token per line.
    Graph6,
}

impl InputFormat {
    /// All formats, in the order their suffixes are checked.
    pub const ALL: [Self; 2] = [Self::HeaderEdgeList, Self::Graph6];

    /// File suffix (without the dot) identifying this format.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::HeaderEdgeList => "gr",
            Self::Graph6 => "graph6",
        }
    }

    /// Short label used in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HeaderEdgeList => "header-edge-list",
            Self::Graph6 => "graph6",
        }
    }

    /// Selects the format from the final suffix of `path`.
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    /// use editbench_core::InputFormat;
    ///
    /// assert_eq!(InputFormat::from_path(Path::new("a/b.gr")), Some(InputFormat::HeaderEdgeList));
    /// assert_eq!(InputFormat::from_path(Path::new("x.graph6")), Some(InputFormat::Graph6));
    /// assert_eq!(InputFormat::from_path(Path::new("x.sif")), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|format| format.suffix() == extension)
    }

    /// Parses in-memory source text in this format.
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is malformed or, for header-annotated
    /// lists, disagrees with its declared counts.
    ///
    /// # Examples
    /// ```
    /// use editbench_core::InputFormat;
    ///
    /// let graph = InputFormat::HeaderEdgeList
    ///     .parse_str("p edge 5 3\n1 2\n2 3\n3 4\n")
    ///     .expect("declared vertices may exceed parsed ones");
    /// assert_eq!(graph.edge_count(), 3);
    /// ```
    pub fn parse_str(self, text: &str) -> Result<Graph, ParseError> {
        match self {
            Self::HeaderEdgeList => header::parse(text),
            Self::Graph6 => graph6::parse(text),
        }
    }
}

/// Reads and parses `path` in the given `format`.
///
/// # Errors
/// Returns [`ParseError::Io`] when the file cannot be read and any parse
/// failure produced by [`InputFormat::parse_str`].
#[instrument(
    name = "format.parse",
    err,
    skip(path),
    fields(path = %path.display(), format = format.label(), vertices = field::Empty, edges = field::Empty),
)]
pub fn parse_file(path: &Path, format: InputFormat) -> Result<Graph, ParseError> {
    let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = format.parse_str(&text)?;
    let span = Span::current();
    span.record("vertices", graph.vertex_count());
    span.record("edges", graph.edge_count());
    Ok(graph)
}

/// Reads `path`, choosing the format from its suffix.
///
/// # Errors
/// Returns [`ParseError::UnsupportedFormat`] for unknown suffixes and any error
/// from [`parse_file`].
pub fn parse_path(path: &Path) -> Result<Graph, ParseError> {
    let format = InputFormat::from_path(path).ok_or_else(|| ParseError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    parse_file(path, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::header("graphs/a.gr", Some(InputFormat::HeaderEdgeList))]
    #[case::graph6("graphs/a.graph6", Some(InputFormat::Graph6))]
    #[case::multi_dot("graphs/a.b.gr", Some(InputFormat::HeaderEdgeList))]
    #[case::canonical("graphs/a.sif", None)]
    #[case::no_suffix("graphs/a", None)]
    fn from_path_uses_final_suffix(#[case] raw: &str, #[case] expected: Option<InputFormat>) {
        assert_eq!(InputFormat::from_path(Path::new(raw)), expected);
    }

    #[test]
    fn parse_path_reads_files_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("path.gr");
        fs::write(&path, "p edge 4 3\n1 2\n2 3\n3 4\n").expect("write fixture");
        let graph = parse_path(&path).expect("fixture must parse");
        assert_eq!(graph.metrics().components, 1);
    }

    #[test]
    fn parse_path_rejects_unknown_suffix() {
        let err = parse_path(Path::new("nowhere.txt")).expect_err("suffix is unsupported");
        assert!(matches!(err, ParseError::UnsupportedFormat { .. }));
    }

    #[test]
    fn parse_file_reports_missing_files() {
        let path = PathBuf::from("/definitely/not/here.gr");
        let err = parse_file(&path, InputFormat::HeaderEdgeList).expect_err("file is missing");
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
