//! graph6 decoding: one compact-encoded graph per line, 0-based vertices.
//!
//! All graphs in a file are merged into one [`Graph`] after shifting vertex
//! identifiers to 1-based. Only edges are inserted, so vertices without
//! incident edges do not appear in the result.

use crate::{
    error::ParseError,
    graph::{Graph, VertexId},
};

const OPTIONAL_HEADER: &str = ">>graph6<<";
const WIDE_ORDER: u8 = 126;
const BIAS: u8 = 63;

pub(super) fn parse(text: &str) -> Result<Graph, ParseError> {
    let mut graph = Graph::new();
    for (index, raw) in text.lines().enumerate() {
        let Some(token) = raw.split_whitespace().next() else {
            continue;
        };
        let edges = decode(token).map_err(|reason| ParseError::InvalidGraph6 {
            line: index + 1,
            reason,
        })?;
        for (u, v) in edges {
            graph.add_edge(u + 1, v + 1);
        }
    }
    Ok(graph)
}

/// Decodes one graph6 token into its 0-based edge list.
pub(crate) fn decode(token: &str) -> Result<Vec<(VertexId, VertexId)>, &'static str> {
    let bytes = token
        .strip_prefix(OPTIONAL_HEADER)
        .unwrap_or(token)
        .as_bytes();
    let (order, body) = decode_order(bytes)?;
    let bits = order
        .checked_mul(order.saturating_sub(1))
        .map(|pairs| pairs / 2)
        .ok_or("graph too large")?;
    let needed = bits.div_ceil(6);
    let available = u64::try_from(body.len()).map_err(|_| "graph too large")?;
    if available < needed {
        return Err("truncated adjacency data");
    }
    if available > needed {
        return Err("unexpected trailing data");
    }

    // Bits enumerate the upper triangle column by column: (0,1), (0,2), (1,2), (0,3), ...
    let mut edges = Vec::new();
    let mut consumed = 0u64;
    let (mut row, mut column) = (0u64, 1u64);
    for &byte in body {
        let value = six_bits(byte)?;
        for shift in (0..6).rev() {
            if consumed == bits {
                break;
            }
            if (value >> shift) & 1 == 1 {
                edges.push((row, column));
            }
            consumed += 1;
            row += 1;
            if row == column {
                row = 0;
                column += 1;
            }
        }
    }
    Ok(edges)
}

fn six_bits(byte: u8) -> Result<u8, &'static str> {
    if (BIAS..=WIDE_ORDER).contains(&byte) {
        Ok(byte - BIAS)
    } else {
        Err("byte outside graph6 range")
    }
}

fn decode_order(bytes: &[u8]) -> Result<(u64, &[u8]), &'static str> {
    match bytes {
        [] => Err("empty token"),
        [WIDE_ORDER, WIDE_ORDER, rest @ ..] => read_wide(rest, 6),
        [WIDE_ORDER, rest @ ..] => read_wide(rest, 3),
        [first, rest @ ..] => Ok((u64::from(six_bits(*first)?), rest)),
    }
}

fn read_wide(bytes: &[u8], width: usize) -> Result<(u64, &[u8]), &'static str> {
    let (digits, rest) = bytes
        .split_at_checked(width)
        .ok_or("invalid size prefix")?;
    let order = digits.iter().try_fold(0u64, |acc, &byte| {
        six_bits(byte).map(|value| (acc << 6) | u64::from(value))
    })?;
    Ok((order, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::single_vertex("@", &[])]
    #[case::edge("A_", &[(0, 1)])]
    #[case::triangle("Bw", &[(0, 1), (0, 2), (1, 2)])]
    #[case::path("Ch", &[(0, 1), (1, 2), (2, 3)])]
    #[case::with_header(">>graph6<<A_", &[(0, 1)])]
    fn decode_yields_zero_based_edges(
        #[case] token: &str,
        #[case] expected: &[(VertexId, VertexId)],
    ) {
        assert_eq!(decode(token).expect("token must decode"), expected);
    }

    #[test]
    fn decode_reads_wide_orders() {
        // n = 63 via the 126-prefixed form; no adjacency bits set.
        let mut token = vec![WIDE_ORDER, BIAS, BIAS, BIAS + 63];
        token.extend(std::iter::repeat_n(BIAS, (63 * 62 / 2usize).div_ceil(6)));
        let token = String::from_utf8(token).expect("graph6 is ASCII");
        assert!(decode(&token).expect("wide order must decode").is_empty());
    }

    #[rstest]
    #[case::empty("", "empty token")]
    #[case::truncated("C", "truncated adjacency data")]
    #[case::trailing("A__", "unexpected trailing data")]
    #[case::out_of_range("A ", "byte outside graph6 range")]
    #[case::short_prefix("~?", "invalid size prefix")]
    fn decode_rejects_malformed_tokens(#[case] token: &str, #[case] reason: &'static str) {
        assert_eq!(decode(token), Err(reason));
    }

    #[test]
    fn parse_merges_lines_and_shifts_to_one_based() {
        let graph = parse("Ch\n\nA_ trailing comment\n").expect("file must parse");
        assert!(graph.contains_edge(1, 2));
        assert!(graph.contains_edge(2, 3));
        assert!(graph.contains_edge(3, 4));
        assert!(!graph.contains_vertex(0));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn parse_reports_offending_line() {
        let err = parse("A_\nC\n").expect_err("second line is truncated");
        assert!(matches!(err, ParseError::InvalidGraph6 { line: 2, .. }));
    }
}
