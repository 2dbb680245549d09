//! Simple undirected graph used for inputs and reconstructed solutions.
//!
//! Edges are stored with their endpoints ordered so that `(u, v)` and
//! `(v, u)` collapse into one entry, and self-pairs never become edges.

mod union_find;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use union_find::DisjointSet;

/// Identifier of a graph vertex as it appears in source files.
pub type VertexId = u64;

/// An unordered vertex pair with `low < high`.
///
/// # Examples
/// ```
/// use editbench_core::Edge;
///
/// let edge = Edge::new(7, 3).expect("distinct endpoints form an edge");
/// assert_eq!(edge.endpoints(), (3, 7));
/// assert!(Edge::new(4, 4).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    low: VertexId,
    high: VertexId,
}

impl Edge {
    /// Builds an edge between two distinct vertices, or `None` for a self-pair.
    #[must_use]
    pub fn new(u: VertexId, v: VertexId) -> Option<Self> {
        match u.cmp(&v) {
            std::cmp::Ordering::Less => Some(Self { low: u, high: v }),
            std::cmp::Ordering::Greater => Some(Self { low: v, high: u }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Returns the endpoints in ascending order.
    #[must_use]
    pub const fn endpoints(self) -> (VertexId, VertexId) {
        (self.low, self.high)
    }
}

/// A simple undirected graph with an optional per-vertex tag.
///
/// # Examples
/// ```
/// use editbench_core::Graph;
///
/// let mut graph = Graph::new();
/// graph.add_edge(1, 2);
/// graph.add_edge(2, 1);
/// graph.add_edge(3, 3);
/// assert_eq!(graph.vertex_count(), 3);
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.component_count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    vertices: BTreeSet<VertexId>,
    edges: BTreeSet<Edge>,
    tags: BTreeMap<VertexId, String>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `vertex`, returning `true` if it was not yet present.
    pub fn add_vertex(&mut self, vertex: VertexId) -> bool {
        self.vertices.insert(vertex)
    }

    /// Inserts both endpoints and the edge between them.
    ///
    /// Returns `true` only when a new edge was created; duplicates and
    /// self-pairs still register their endpoints as vertices.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> bool {
        self.vertices.insert(u);
        self.vertices.insert(v);
        Edge::new(u, v).is_some_and(|edge| self.edges.insert(edge))
    }

    /// Attaches a display tag (a cluster color) to `vertex`, inserting it if needed.
    pub fn set_tag(&mut self, vertex: VertexId, tag: impl Into<String>) {
        self.vertices.insert(vertex);
        self.tags.insert(vertex, tag.into());
    }

    /// Returns the tag attached to `vertex`, if any.
    #[must_use]
    pub fn tag(&self, vertex: VertexId) -> Option<&str> {
        self.tags.get(&vertex).map(String::as_str)
    }

    /// Returns whether `vertex` belongs to the graph.
    #[must_use]
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Returns whether `u` and `v` are adjacent.
    #[must_use]
    pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
        Edge::new(u, v).is_some_and(|edge| self.edges.contains(&edge))
    }

    /// Iterates the vertices in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    /// Iterates the edges in ascending `(low, high)` order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of connected components; isolated vertices count individually.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let index: HashMap<VertexId, usize> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(position, &vertex)| (vertex, position))
            .collect();
        let mut set = DisjointSet::new(index.len());
        for edge in &self.edges {
            let (low, high) = edge.endpoints();
            if let (Some(&left), Some(&right)) = (index.get(&low), index.get(&high)) {
                set.union(left, right);
            }
        }
        set.components()
    }

    /// Computes the summary triple reported for this graph.
    #[must_use]
    pub fn metrics(&self) -> GraphMetrics {
        GraphMetrics {
            vertices: self.vertex_count(),
            edges: self.edge_count(),
            components: self.component_count(),
        }
    }
}

/// Vertex, edge, and connected-component counts of a [`Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphMetrics {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of edges.
    pub edges: usize,
    /// Number of connected components.
    pub components: usize,
}

impl GraphMetrics {
    /// Formats the vertex/edge pair as `G = (V, E)`.
    ///
    /// # Examples
    /// ```
    /// use editbench_core::GraphMetrics;
    ///
    /// let metrics = GraphMetrics { vertices: 4, edges: 3, components: 1 };
    /// assert_eq!(metrics.shape(), "G = (4, 3)");
    /// ```
    #[must_use]
    pub fn shape(&self) -> String {
        format!("G = ({}, {})", self.vertices, self.edges)
    }

    /// Absolute change in edge count, the edit-distance proxy in reports.
    #[must_use]
    pub const fn edge_distance(&self, solution: &Self) -> usize {
        self.edges.abs_diff(solution.edges)
    }
}
