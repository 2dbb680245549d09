//! Rebuilding solution graphs from solver output.
//!
//! The solver writes a GML file naming the cluster of every vertex. Each
//! cluster becomes a complete subgraph of the solution, and each cluster is
//! given a display color for the plotting collaborator.

mod gml;
mod palette;

use std::{
    collections::{HashMap, hash_map::Entry},
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{Span, debug, field, instrument, warn};

pub use palette::{Color, Palette};

use crate::{
    error::ReconstructError,
    graph::{Graph, VertexId},
};

/// Vertices grouped under one solver-assigned label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    label: String,
    members: Vec<VertexId>,
}

impl Cluster {
    /// Label the solver gave this cluster.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Member vertices in order of appearance.
    #[must_use]
    pub fn members(&self) -> &[VertexId] {
        &self.members
    }
}

/// One entry of the plotting dump: member vertices and their display color.
///
/// Serialises as the JSON pair `[[v, ...], "#rrggbb"]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoredCluster(pub Vec<VertexId>, pub String);

/// Vertex-to-cluster mapping, with clusters ranked by first appearance.
///
/// # Examples
/// ```
/// use editbench_core::reconstruct::{ClusterAssignment, Palette};
///
/// let assignment = ClusterAssignment::from_pairs([(1, "a"), (2, "a"), (3, "b")]);
/// let solution = assignment.to_graph(Palette::default());
/// assert_eq!(solution.edge_count(), 1);
/// assert_eq!(solution.component_count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterAssignment {
    clusters: Vec<Cluster>,
}

impl ClusterAssignment {
    /// Groups `(vertex, label)` pairs; a vertex keeps its first label.
    pub fn from_pairs<I, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (VertexId, L)>,
        L: Into<String>,
    {
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut rank_of: HashMap<String, usize> = HashMap::new();
        let mut seen: HashMap<VertexId, usize> = HashMap::new();
        for (vertex, raw_label) in pairs {
            let label = raw_label.into();
            let rank = match rank_of.entry(label) {
                Entry::Occupied(slot) => *slot.get(),
                Entry::Vacant(slot) => {
                    clusters.push(Cluster {
                        label: slot.key().clone(),
                        members: Vec::new(),
                    });
                    *slot.insert(clusters.len() - 1)
                }
            };
            match seen.entry(vertex) {
                Entry::Occupied(first) => {
                    warn!(vertex, first_rank = *first.get(), rank, "vertex listed twice, keeping first cluster");
                }
                Entry::Vacant(slot) => {
                    slot.insert(rank);
                    if let Some(cluster) = clusters.get_mut(rank) {
                        cluster.members.push(vertex);
                    }
                }
            }
        }
        clusters.retain(|cluster| !cluster.members.is_empty());
        Self { clusters }
    }

    /// Parses solver-written GML text.
    ///
    /// # Errors
    /// Returns [`ReconstructError`] when a node block is unterminated, lacks
    /// the vertex or cluster field, or names a non-numeric vertex.
    pub fn from_gml_str(text: &str) -> Result<Self, ReconstructError> {
        let pairs = gml::NodeBlocks::new(text)
            .enumerate()
            .map(|(index, block)| block.and_then(|body| gml::parse_node(index, body)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_pairs(pairs))
    }

    /// Clusters in rank order.
    #[must_use]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Whether no vertex was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Builds the solution graph: one clique per cluster, vertices tagged with
    /// their cluster color.
    #[must_use]
    pub fn to_graph(&self, palette: Palette) -> Graph {
        let mut graph = Graph::new();
        for (rank, cluster) in self.clusters.iter().enumerate() {
            let color = palette.color(rank).to_string();
            for (position, &vertex) in cluster.members.iter().enumerate() {
                graph.set_tag(vertex, color.clone());
                for &other in cluster.members.iter().skip(position + 1) {
                    graph.add_edge(vertex, other);
                }
            }
        }
        graph
    }

    /// Clusters paired with their display colors, as handed to plotting.
    #[must_use]
    pub fn colored(&self, palette: Palette) -> Vec<ColoredCluster> {
        self.clusters
            .iter()
            .enumerate()
            .map(|(rank, cluster)| {
                ColoredCluster(cluster.members.clone(), palette.color(rank).to_string())
            })
            .collect()
    }

    /// Writes the colored clusters as JSON `[[[v, ...], "#rrggbb"], ...]`.
    ///
    /// # Errors
    /// Returns [`ReconstructError::Io`] if the file cannot be written.
    pub fn write_dump(&self, palette: Palette, path: &Path) -> Result<(), ReconstructError> {
        let wrap = |source| ReconstructError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(wrap)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.colored(palette))
            .map_err(io::Error::from)
            .map_err(wrap)?;
        writer.flush().map_err(wrap)
    }
}

/// Solution recovered from one solver run.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Cluster membership as reported by the solver.
    pub assignment: ClusterAssignment,
    /// Clique graph implied by the assignment.
    pub graph: Graph,
}

/// Reads the solver's GML output at `path` and rebuilds the solution graph.
///
/// # Errors
/// Returns [`ReconstructError::Io`] when the file cannot be read and any
/// error from [`ClusterAssignment::from_gml_str`].
#[instrument(
    name = "reconstruct.gml",
    err,
    skip(path, palette),
    fields(path = %path.display(), clusters = field::Empty, edges = field::Empty),
)]
pub fn reconstruct(path: &Path, palette: Palette) -> Result<Solution, ReconstructError> {
    let text = fs::read_to_string(path).map_err(|source| ReconstructError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let assignment = ClusterAssignment::from_gml_str(&text)?;
    let graph = assignment.to_graph(palette);
    let span = Span::current();
    span.record("clusters", assignment.len());
    span.record("edges", graph.edge_count());
    debug!(vertices = graph.vertex_count(), "solution rebuilt");
    Ok(Solution { assignment, graph })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use tempfile::TempDir;

    use crate::graph::Edge;

    const SAMPLE: &str = "graph [\n  node [ id 0 label \"1\" cluster 0 ]\n  \
                          node [ id 1 label \"2\" cluster 0 ]\n  node [ id 2 label \"3\" cluster 0 ]\n  \
                          node [ id 3 label \"7\" cluster 5 ]\n  node [ id 4 label \"8\" cluster 5 ]\n]\n";

    #[test]
    fn clusters_become_cliques() {
        let assignment = ClusterAssignment::from_gml_str(SAMPLE).expect("sample parses");
        let graph = assignment.to_graph(Palette::default());

        assert_eq!(assignment.len(), 2);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.contains_edge(1, 3));
        assert!(graph.contains_edge(7, 8));
        assert!(!graph.contains_edge(3, 7));
        assert_eq!(graph.component_count(), 2);
    }

    #[test]
    fn clusters_get_distinct_tags() {
        let assignment = ClusterAssignment::from_gml_str(SAMPLE).expect("sample parses");
        let graph = assignment.to_graph(Palette::default());
        assert_eq!(graph.tag(1), graph.tag(2));
        assert_ne!(graph.tag(1), graph.tag(7));
    }

    #[test]
    fn singleton_cluster_is_an_isolated_vertex() {
        let assignment = ClusterAssignment::from_pairs([(4, "x")]);
        let graph = assignment.to_graph(Palette::default());
        assert!(graph.contains_vertex(4));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.component_count(), 1);
    }

    #[test]
    fn repeated_vertex_keeps_first_cluster() {
        let assignment = ClusterAssignment::from_pairs([(1, "a"), (2, "a"), (1, "b")]);
        assert_eq!(assignment.len(), 1);
        assert_eq!(assignment.clusters()[0].members(), &[1, 2]);
    }

    #[test]
    fn ranks_follow_first_appearance() {
        let assignment = ClusterAssignment::from_pairs([(5, "z"), (1, "a"), (6, "z")]);
        let labels: Vec<&str> = assignment.clusters().iter().map(Cluster::label).collect();
        assert_eq!(labels, ["z", "a"]);
    }

    #[test]
    fn dump_is_json_pairs_of_members_and_color() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join(".g.json");
        let assignment = ClusterAssignment::from_pairs([(1, "a"), (2, "a"), (3, "b")]);
        assignment
            .write_dump(Palette::default(), &path)
            .expect("dump written");

        let raw = fs::read_to_string(&path).expect("dump readable");
        let parsed: Vec<ColoredCluster> = serde_json::from_str(&raw).expect("dump is JSON");
        assert_eq!(parsed, assignment.colored(Palette::default()));
        assert_eq!(parsed[0].0, [1, 2]);
        assert_eq!(parsed[1].0, [3]);
        assert!(raw.starts_with("[[[1,2],\"#"));
    }

    #[test]
    fn reconstruct_reads_files() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("g.gml");
        fs::write(&path, SAMPLE).expect("write sample");
        let solution = reconstruct(&path, Palette::default()).expect("sample parses");
        assert_eq!(solution.graph.metrics().vertices, 5);
    }

    #[test]
    fn reconstruct_reports_missing_output() {
        let err = reconstruct(Path::new("/no/such/output.gml"), Palette::default())
            .expect_err("file is missing");
        assert!(matches!(err, ReconstructError::Io { .. }));
    }

    fn implied_edges(labels: &[(VertexId, u8)]) -> BTreeSet<Edge> {
        let mut edges = BTreeSet::new();
        for (index, &(u, left)) in labels.iter().enumerate() {
            for &(v, right) in labels.iter().skip(index + 1) {
                if left == right {
                    edges.extend(Edge::new(u, v));
                }
            }
        }
        edges
    }

    proptest! {
        #[test]
        fn reconstruction_matches_cluster_grouping(
            membership in proptest::collection::btree_map(1u64..200, 0u8..6, 0..40),
        ) {
            let labels: Vec<(VertexId, u8)> = membership.into_iter().collect();
            let gml: String = labels
                .iter()
                .enumerate()
                .map(|(id, (vertex, cluster))| {
                    format!("node [ id {id} label \"{vertex}\" cluster {cluster} ]\n")
                })
                .collect();

            let graph = ClusterAssignment::from_gml_str(&gml)
                .expect("generated GML parses")
                .to_graph(Palette::default());

            let rebuilt: BTreeSet<Edge> = graph.edges().collect();
            prop_assert_eq!(rebuilt, implied_edges(&labels));
            prop_assert_eq!(graph.vertex_count(), labels.len());
        }
    }
}
