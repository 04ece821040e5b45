//! Graph construction policies
//!
//! Both policies share the tiling scaffolding in the builder: the builder
//! scores a block of rows against a block of columns and hands the score tile
//! to the policy, which decides which pairs survive. Scores are discarded as
//! soon as the policy returns.

use super::config::PolicyConfig;
use crate::graph::CandidateEdge;
use ndarray::ArrayView2;
use simgraph_algorithms::TopN;
use std::cmp::Ordering;
use std::fmt;

/// One scored tile.
///
/// `scores[[r, c]]` is the similarity of store rows `row_start + r` and
/// `col_start + c`. `rank` maps a store row to its position in id order,
/// which is the node index the edge will carry.
#[derive(Debug, Clone, Copy)]
pub struct ScoredTile<'a> {
    pub row_start: usize,
    pub col_start: usize,
    pub scores: ArrayView2<'a, f32>,
    pub rank: &'a [u32],
}

/// Strategy deciding which scored pairs become edges
pub trait GraphConstructionPolicy: Send + Sync + fmt::Debug {
    /// The configuration this policy was built from
    fn describe(&self) -> PolicyConfig;

    /// First column a tile starting at `row_start` must be scored against
    fn first_column(&self, row_start: usize) -> usize;

    /// Append the surviving pairs of `tile` to `out`
    fn select(&self, tile: &ScoredTile<'_>, out: &mut Vec<CandidateEdge>);
}

impl PolicyConfig {
    /// Build the strategy for this configuration
    pub fn instantiate(&self) -> Box<dyn GraphConstructionPolicy> {
        match *self {
            PolicyConfig::Threshold { tau } => Box::new(DenseThreshold { tau }),
            PolicyConfig::Knn { k } => Box::new(SparseKnn { k }),
        }
    }
}

/// Keep every unordered pair with similarity strictly above `tau`.
///
/// Only the upper triangle is scored, so each pair is seen exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseThreshold {
    pub tau: f32,
}

impl GraphConstructionPolicy for DenseThreshold {
    fn describe(&self) -> PolicyConfig {
        PolicyConfig::Threshold { tau: self.tau }
    }

    fn first_column(&self, row_start: usize) -> usize {
        row_start
    }

    fn select(&self, tile: &ScoredTile<'_>, out: &mut Vec<CandidateEdge>) {
        for (r, row) in tile.scores.rows().into_iter().enumerate() {
            let i = tile.row_start + r;
            let first = (i + 1).saturating_sub(tile.col_start);
            for (c, &score) in row.iter().enumerate().skip(first) {
                if score > self.tau {
                    out.push(CandidateEdge {
                        from: tile.rank[i],
                        to: tile.rank[tile.col_start + c],
                        weight: score,
                    });
                }
            }
        }
    }
}

/// Keep each document's `k` most similar other documents.
///
/// Every row is scored against the whole corpus; a pair chosen from both
/// sides is merged into one edge afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseKnn {
    pub k: usize,
}

/// Ranking of a candidate neighbor: higher score first, then smaller id
#[derive(Debug, Clone, Copy, PartialEq)]
struct Neighbor {
    score: f32,
    rank: u32,
}

impl Neighbor {
    fn new(score: f32, rank: u32) -> Self {
        // Fold -0.0 into 0.0 so total_cmp treats them as a tie
        Self {
            score: score + 0.0,
            rank,
        }
    }
}

impl Eq for Neighbor {}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl GraphConstructionPolicy for SparseKnn {
    fn describe(&self) -> PolicyConfig {
        PolicyConfig::Knn { k: self.k }
    }

    fn first_column(&self, _row_start: usize) -> usize {
        0
    }

    fn select(&self, tile: &ScoredTile<'_>, out: &mut Vec<CandidateEdge>) {
        for (r, row) in tile.scores.rows().into_iter().enumerate() {
            let i = tile.row_start + r;
            let mut best = TopN::new(self.k);
            for (c, &score) in row.iter().enumerate() {
                let j = tile.col_start + c;
                if j != i {
                    best.push(Neighbor::new(score, tile.rank[j]));
                }
            }
            out.extend(best.into_sorted_vec().into_iter().map(|n| CandidateEdge {
                from: tile.rank[i],
                to: n.rank,
                weight: n.score,
            }));
        }
    }
}
