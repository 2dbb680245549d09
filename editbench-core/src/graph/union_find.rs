//! Disjoint sets over dense indices, used to count connected components.
//!
//! Vertex identifiers come straight from input files and may be sparse
//! (`1`, `70_000`, `u64::MAX`), so [`Graph::component_count`](super::Graph::component_count)
//! numbers the vertex set `0..n` first; a forest indexed by raw identifiers
//! would be sized by the largest id rather than the vertex count.

#[derive(Clone, Debug)]
pub(super) struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
    components: usize,
}

impl DisjointSet {
    pub(super) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            components: n,
        }
    }

    /// Representative of `node`'s set, halving the path on the way up.
    pub(super) fn root(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            let grandparent = self.parent[self.parent[node]];
            self.parent[node] = grandparent;
            node = grandparent;
        }
        node
    }

    /// Joins the sets of `left` and `right`, hanging the smaller under the
    /// larger. Returns `false` when they already share a set.
    pub(super) fn union(&mut self, left: usize, right: usize) -> bool {
        let (left, right) = (self.root(left), self.root(right));
        if left == right {
            return false;
        }
        let (larger, smaller) = if self.size[left] >= self.size[right] {
            (left, right)
        } else {
            (right, left)
        };
        self.parent[smaller] = larger;
        self.size[larger] += self.size[smaller];
        self.components -= 1;
        true
    }

    pub(super) const fn components(&self) -> usize {
        self.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_reports_merges_and_tracks_components() {
        let mut set = DisjointSet::new(4);
        assert_eq!(set.components(), 4);
        assert!(set.union(0, 1));
        assert!(set.union(2, 3));
        assert!(!set.union(1, 0));
        assert_eq!(set.components(), 2);
        assert!(set.union(1, 3));
        assert_eq!(set.components(), 1);
        assert_eq!(set.root(0), set.root(2));
    }

    #[test]
    fn smaller_set_hangs_under_larger() {
        let mut set = DisjointSet::new(4);
        set.union(0, 1);
        set.union(0, 2);
        let big = set.root(0);
        set.union(3, 0);
        assert_eq!(set.root(3), big);
    }
}
