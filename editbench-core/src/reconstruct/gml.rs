//! Extraction of `node [ ... ]` records from solver-written GML.
//!
//! Only node blocks are inspected. Each block body is stripped of `"` and
//! split on whitespace; the vertex sits at token 3 and the cluster label at
//! token 5, as in `node [ id 0 label "7" cluster 2 ]`.

use crate::{error::ReconstructError, graph::VertexId};

const NODE_KEY: &str = "node";
const VERTEX_FIELD: usize = 3;
const CLUSTER_FIELD: usize = 5;

/// Iterates the bodies of `node [ ... ]` blocks in document order.
pub(super) struct NodeBlocks<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> NodeBlocks<'a> {
    pub(super) const fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }
}

impl<'a> Iterator for NodeBlocks<'a> {
    type Item = Result<&'a str, ReconstructError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let found = self.text.get(self.cursor..)?.find(NODE_KEY)?;
            let start = self.cursor + found;
            let after_key = start + NODE_KEY.len();
            self.cursor = after_key;
            if !starts_word(self.text, start) {
                continue;
            }
            let tail = self.text.get(after_key..)?;
            let trimmed = tail.trim_start();
            if !trimmed.starts_with('[') {
                continue;
            }
            let open = after_key + (tail.len() - trimmed.len());
            let body = self.text.get(open + 1..)?;
            let Some(close) = body.find(']') else {
                self.cursor = self.text.len();
                return Some(Err(ReconstructError::UnterminatedNode { offset: open }));
            };
            self.cursor = open + 1 + close + 1;
            return body.get(..close).map(Ok);
        }
    }
}

fn starts_word(text: &str, start: usize) -> bool {
    text.get(..start)
        .and_then(|before| before.chars().next_back())
        .is_none_or(|previous| !(previous.is_alphanumeric() || previous == '_'))
}

/// Reads the vertex and cluster label out of the `index`-th node body.
pub(super) fn parse_node(index: usize, body: &str) -> Result<(VertexId, String), ReconstructError> {
    let cleaned = body.replace('"', "");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let field = |position: usize| {
        tokens
            .get(position)
            .copied()
            .ok_or(ReconstructError::MissingField {
                node: index,
                field: position,
            })
    };
    let raw_vertex = field(VERTEX_FIELD)?;
    let vertex = raw_vertex
        .parse::<VertexId>()
        .map_err(|_| ReconstructError::InvalidVertex {
            node: index,
            value: raw_vertex.to_owned(),
        })?;
    let label = field(CLUSTER_FIELD)?;
    Ok((vertex, label.to_owned()))
}
