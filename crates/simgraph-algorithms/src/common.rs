//! Shared utilities for graph algorithms
//!
//! Provides a read-only, dense view of an undirected weighted graph for
//! algorithm execution.

/// Dense node index (0..N)
pub type NodeIndex = usize;

/// A dense, integer-indexed view of an undirected graph in Compressed Sparse Row (CSR) format.
///
/// Every undirected edge `{u, v}` appears twice, once in the row of `u` and once
/// in the row of `v`. Each row is sorted by neighbor index, which lets callers
/// split a row into lower and higher neighbors with a binary search and
/// intersect rows with a linear merge.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<NodeIndex>,
    /// Edge weights: aligned with `targets`
    pub weights: Vec<f32>,
}

impl GraphView {
    /// Build a view from a list of undirected edges.
    ///
    /// Self-loops are skipped. Duplicate pairs are kept as given, so callers
    /// are expected to pass an already de-duplicated edge list.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeIndex, NodeIndex, f32)>,
    {
        let mut rows: Vec<Vec<(NodeIndex, f32)>> = vec![Vec::new(); node_count];
        for (u, v, w) in edges {
            if u == v {
                continue;
            }
            rows[u].push((v, w));
            rows[v].push((u, w));
        }

        let total: usize = rows.iter().map(Vec::len).sum();
        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::with_capacity(total);
        let mut weights = Vec::with_capacity(total);

        offsets.push(0);
        for mut row in rows {
            row.sort_unstable_by_key(|&(v, _)| v);
            for (v, w) in row {
                targets.push(v);
                weights.push(w);
            }
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            offsets,
            targets,
            weights,
        }
    }

    /// Number of undirected edges in the view
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Degree of a node (by index)
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Sorted neighbors of a node
    pub fn neighbors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Weights aligned with `neighbors(idx)`
    pub fn weights(&self, idx: NodeIndex) -> &[f32] {
        &self.weights[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Neighbors with a larger index than `idx`.
    ///
    /// Orienting every edge from lower to higher index makes each clique
    /// reachable from exactly one start node.
    pub fn higher_neighbors(&self, idx: NodeIndex) -> &[NodeIndex] {
        let row = self.neighbors(idx);
        let split = row.partition_point(|&v| v <= idx);
        &row[split..]
    }

    /// Weight of the edge between `u` and `v`, if present
    pub fn weight_between(&self, u: NodeIndex, v: NodeIndex) -> Option<f32> {
        let row = self.neighbors(u);
        row.binary_search(&v).ok().map(|pos| self.weights(u)[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_view() -> GraphView {
        // 0 - 1 - 2, plus an isolated node 3
        GraphView::from_edges(4, vec![(1, 2, 0.5), (0, 1, 0.9)])
    }

    #[test]
    fn test_rows_are_symmetric_and_sorted() {
        let view = path_view();
        assert_eq!(view.edge_count(), 2);
        assert_eq!(view.neighbors(0), &[1]);
        assert_eq!(view.neighbors(1), &[0, 2]);
        assert_eq!(view.neighbors(2), &[1]);
        assert_eq!(view.degree(3), 0);
        assert_eq!(view.weights(1), &[0.9, 0.5]);
    }

    #[test]
    fn test_higher_neighbors() {
        let view = path_view();
        assert_eq!(view.higher_neighbors(0), &[1]);
        assert_eq!(view.higher_neighbors(1), &[2]);
        assert!(view.higher_neighbors(2).is_empty());
    }

    #[test]
    fn test_weight_between() {
        let view = path_view();
        assert_eq!(view.weight_between(2, 1), Some(0.5));
        assert_eq!(view.weight_between(0, 2), None);
    }

    #[test]
    fn test_self_loops_skipped() {
        let view = GraphView::from_edges(2, vec![(0, 0, 1.0), (0, 1, 0.3)]);
        assert_eq!(view.edge_count(), 1);
        assert_eq!(view.neighbors(0), &[1]);
    }
}
