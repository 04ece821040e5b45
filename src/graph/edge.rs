//! Similarity edge implementation
//!
//! Edges address nodes by their position in the graph's id-sorted node list,
//! so a pair `(source, target)` with `source < target` is also ordered by id.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest difference allowed between two discoveries of the same pair.
///
/// Tiles of different shapes may round the same dot product differently in the
/// last bits; anything above this is a builder bug.
pub const WEIGHT_TOLERANCE: f32 = 1e-5;

/// Undirected, canonically ordered edge (`source < target`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub source: u32,
    pub target: u32,
    pub weight: f32,
}

impl SimilarityEdge {
    /// Canonical edge for an unordered pair
    pub fn new(a: u32, b: u32, weight: f32) -> Self {
        SimilarityEdge {
            source: a.min(b),
            target: a.max(b),
            weight,
        }
    }

    /// The endpoint that is not `node`
    pub fn other(&self, node: u32) -> u32 {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// A pair as discovered while scanning the row of `from`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEdge {
    pub from: u32,
    pub to: u32,
    pub weight: f32,
}

/// Why a candidate list could not be merged into an edge set
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeMergeError {
    SelfLoop(u32),
    WeightMismatch {
        source: u32,
        target: u32,
        first: f32,
        second: f32,
    },
}

/// Result of merging candidates
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEdges {
    /// Sorted by (source, target), one entry per unordered pair
    pub edges: Vec<SimilarityEdge>,
    /// Number of candidates folded into an already present pair
    pub duplicates: usize,
}

/// Canonicalise, sort and de-duplicate candidates.
///
/// When a pair was discovered twice the two weights must agree within
/// [`WEIGHT_TOLERANCE`]; the weight seen from the smaller endpoint's row is kept.
pub fn merge_candidates(candidates: Vec<CandidateEdge>) -> Result<MergedEdges, EdgeMergeError> {
    if let Some(c) = candidates.iter().find(|c| c.from == c.to) {
        return Err(EdgeMergeError::SelfLoop(c.from));
    }

    // (source, target, seen-from-target) puts the source-row discovery first
    let mut keyed: Vec<(u32, u32, bool, f32)> = candidates
        .into_par_iter()
        .map(|c| (c.from.min(c.to), c.from.max(c.to), c.from > c.to, c.weight))
        .collect();
    keyed.par_sort_unstable_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut edges: Vec<SimilarityEdge> = Vec::with_capacity(keyed.len());
    let mut duplicates = 0;
    for (source, target, _, weight) in keyed {
        if let Some(last) = edges.last() {
            if last.source == source && last.target == target {
                if (last.weight - weight).abs() > WEIGHT_TOLERANCE {
                    return Err(EdgeMergeError::WeightMismatch {
                        source,
                        target,
                        first: last.weight,
                        second: weight,
                    });
                }
                duplicates += 1;
                continue;
            }
        }
        edges.push(SimilarityEdge {
            source,
            target,
            weight,
        });
    }
    edges.shrink_to_fit();

    Ok(MergedEdges { edges, duplicates })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(from: u32, to: u32, weight: f32) -> CandidateEdge {
        CandidateEdge { from, to, weight }
    }

    #[test]
    fn test_canonical_order() {
        let e = SimilarityEdge::new(7, 3, 0.5);
        assert_eq!((e.source, e.target), (3, 7));
        assert_eq!(e.other(3), 7);
        assert_eq!(e.other(7), 3);
    }

    #[test]
    fn test_merge_sorts_and_dedupes() {
        let merged = merge_candidates(vec![
            c(2, 0, 0.8),
            c(1, 2, 0.6),
            c(0, 2, 0.8),
            c(0, 1, 0.9),
        ])
        .unwrap();

        let pairs: Vec<(u32, u32)> = merged.edges.iter().map(|e| (e.source, e.target)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(merged.duplicates, 1);
    }

    #[test]
    fn test_merge_keeps_source_row_weight() {
        let merged = merge_candidates(vec![c(4, 1, 0.700_001), c(1, 4, 0.7)]).unwrap();
        assert_eq!(merged.edges[0].weight, 0.7);
    }

    #[test]
    fn test_weight_mismatch_fails() {
        let err = merge_candidates(vec![c(0, 1, 0.9), c(1, 0, 0.5)]).unwrap_err();
        assert!(matches!(err, EdgeMergeError::WeightMismatch { source: 0, target: 1, .. }));
    }

    #[test]
    fn test_self_loop_fails() {
        assert_eq!(
            merge_candidates(vec![c(3, 3, 1.0)]).unwrap_err(),
            EdgeMergeError::SelfLoop(3)
        );
    }
}
