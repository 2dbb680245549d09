//! Header-annotated edge lists (`p <name> <V> <E>` followed by `<u> <v>` lines).

use crate::{
    error::ParseError,
    graph::{Graph, VertexId},
};

const COMMENT_MARKER: char = 'c';
const HEADER_MARKER: char = 'p';

/// Counts declared by the metadata line; only used to validate the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphDescriptor {
    /// Declared vertex count `Vd`.
    pub vertices: usize,
    /// Declared edge count `Ed`.
    pub edges: usize,
}

impl GraphDescriptor {
    /// Checks the parsed graph against the declared counts.
    ///
    /// The edge count must match exactly, while the declared vertex count may
    /// exceed the parsed one because isolated vertices never appear in an edge
    /// list.
    ///
    /// # Errors
    /// Returns [`ParseError::MetadataMismatch`] when the counts disagree.
    pub fn validate(self, graph: &Graph) -> Result<(), ParseError> {
        let parsed_vertices = graph.vertex_count();
        let parsed_edges = graph.edge_count();
        if parsed_edges == self.edges && parsed_vertices <= self.vertices {
            return Ok(());
        }
        Err(ParseError::MetadataMismatch {
            declared_vertices: self.vertices,
            declared_edges: self.edges,
            parsed_vertices,
            parsed_edges,
        })
    }
}

enum Line<'a> {
    Blank,
    Comment,
    Header(&'a str),
    Edge(&'a str),
}

fn classify(raw: &str) -> Line<'_> {
    let trimmed = raw.trim();
    match trimmed.chars().next() {
        None => Line::Blank,
        Some(COMMENT_MARKER) => Line::Comment,
        Some(HEADER_MARKER) => Line::Header(trimmed),
        Some(_) => Line::Edge(trimmed),
    }
}

/// Parses a header-annotated edge list and validates it against its header.
pub(super) fn parse(text: &str) -> Result<Graph, ParseError> {
    let headers: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| match classify(raw) {
            Line::Header(header) => Some((index + 1, header)),
            _ => None,
        })
        .collect();
    let descriptor = match headers.as_slice() {
        [] => return Err(ParseError::MissingHeader),
        [(line, header)] => parse_header(*line, header)?,
        many => return Err(ParseError::AmbiguousHeader { count: many.len() }),
    };

    let mut graph = Graph::new();
    for (index, raw) in text.lines().enumerate() {
        if let Line::Edge(body) = classify(raw) {
            let (u, v) = parse_edge(body).ok_or(ParseError::MalformedEdgeLine { line: index + 1 })?;
            graph.add_edge(u, v);
        }
    }

    descriptor.validate(&graph)?;
    Ok(graph)
}

fn parse_header(line: usize, header: &str) -> Result<GraphDescriptor, ParseError> {
    let malformed = || ParseError::MalformedHeader { line };
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let [marker, _name, vertices, edges] = tokens.as_slice() else {
        return Err(malformed());
    };
    if *marker != "p" {
        return Err(malformed());
    }
    let vertices = parse_count(vertices).ok_or_else(malformed)?;
    let edges = parse_count(edges).ok_or_else(malformed)?;
    Ok(GraphDescriptor { vertices, edges })
}

fn parse_edge(body: &str) -> Option<(VertexId, VertexId)> {
    let mut tokens = body.split_whitespace();
    let u = parse_vertex(tokens.next()?)?;
    let v = parse_vertex(tokens.next()?)?;
    tokens.next().is_none().then_some((u, v))
}

// `str::parse` accepts a leading `+`; only bare digits are valid here.
fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit())
}

fn parse_vertex(token: &str) -> Option<VertexId> {
    is_digits(token).then(|| token.parse().ok()).flatten()
}

fn parse_count(token: &str) -> Option<usize> {
    is_digits(token).then(|| token.parse().ok()).flatten()
}
