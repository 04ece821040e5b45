//! Graph comparison
//!
//! Checks whether two graphs over the same corpus agree, e.g. a build against
//! its re-import or two builds run with different worker counts.

use crate::graph::Graph;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightMismatch {
    pub source_id: String,
    pub target_id: String,
    pub left: f32,
    pub right: f32,
}

/// Differences between two graphs, in canonical edge order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphComparison {
    pub nodes_only_in_left: Vec<String>,
    pub nodes_only_in_right: Vec<String>,
    pub edges_only_in_left: Vec<(String, String)>,
    pub edges_only_in_right: Vec<(String, String)>,
    pub weight_mismatches: Vec<WeightMismatch>,
}

impl GraphComparison {
    pub fn is_equivalent(&self) -> bool {
        self.nodes_only_in_left.is_empty()
            && self.nodes_only_in_right.is_empty()
            && self.edges_only_in_left.is_empty()
            && self.edges_only_in_right.is_empty()
            && self.weight_mismatches.is_empty()
    }
}

/// Compare node sets and edge sets; weights within `tolerance` count as equal
pub fn compare_graphs(left: &Graph, right: &Graph, tolerance: f32) -> GraphComparison {
    let left_ids: FxHashSet<&str> = left.nodes().iter().map(|n| n.id.as_str()).collect();
    let right_ids: FxHashSet<&str> = right.nodes().iter().map(|n| n.id.as_str()).collect();

    let mut comparison = GraphComparison {
        nodes_only_in_left: left
            .nodes()
            .iter()
            .filter(|n| !right_ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect(),
        nodes_only_in_right: right
            .nodes()
            .iter()
            .filter(|n| !left_ids.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect(),
        ..Default::default()
    };

    let right_edges: FxHashMap<(&str, &str), f32> = right
        .edge_refs()
        .map(|e| ((e.source.id.as_str(), e.target.id.as_str()), e.weight))
        .collect();
    let mut left_keys = FxHashSet::default();

    for edge in left.edge_refs() {
        let key = (edge.source.id.as_str(), edge.target.id.as_str());
        left_keys.insert(key);
        match right_edges.get(&key) {
            None => comparison
                .edges_only_in_left
                .push((key.0.to_string(), key.1.to_string())),
            Some(&weight) if (weight - edge.weight).abs() > tolerance => {
                comparison.weight_mismatches.push(WeightMismatch {
                    source_id: key.0.to_string(),
                    target_id: key.1.to_string(),
                    left: edge.weight,
                    right: weight,
                })
            }
            Some(_) => {}
        }
    }

    comparison.edges_only_in_right = right
        .edge_refs()
        .map(|e| (e.source.id.as_str(), e.target.id.as_str()))
        .filter(|key| !left_keys.contains(key))
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect();

    comparison
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DocumentNode, GraphProvenance, SimilarityEdge};

    fn graph(ids: &[&str], edges: &[(u32, u32, f32)]) -> Graph {
        Graph::new(
            ids.iter().map(|id| DocumentNode::new(*id, *id, vec![])).collect(),
            edges.iter().map(|&(a, b, w)| SimilarityEdge::new(a, b, w)).collect(),
            GraphProvenance::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_graphs_are_equivalent() {
        let g = graph(&["a", "b", "c"], &[(0, 1, 0.5), (1, 2, 0.7)]);
        assert!(compare_graphs(&g, &g.clone(), 0.0).is_equivalent());
    }

    #[test]
    fn test_reports_each_kind_of_difference() {
        let left = graph(&["a", "b", "c"], &[(0, 1, 0.5), (1, 2, 0.7)]);
        let right = graph(&["a", "b", "d"], &[(0, 1, 0.6), (0, 2, 0.9)]);
        let diff = compare_graphs(&left, &right, 1e-5);

        assert_eq!(diff.nodes_only_in_left, vec!["c"]);
        assert_eq!(diff.nodes_only_in_right, vec!["d"]);
        assert_eq!(diff.edges_only_in_left, vec![("b".to_string(), "c".to_string())]);
        assert_eq!(diff.edges_only_in_right, vec![("a".to_string(), "d".to_string())]);
        assert_eq!(diff.weight_mismatches.len(), 1);
        assert_eq!(diff.weight_mismatches[0].left, 0.5);
        assert!(!diff.is_equivalent());
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let left = graph(&["a", "b"], &[(0, 1, 0.5)]);
        let right = graph(&["a", "b"], &[(0, 1, 0.500001)]);
        assert!(compare_graphs(&left, &right, 1e-5).is_equivalent());
        assert!(!compare_graphs(&left, &right, 0.0).is_equivalent());
    }
}
