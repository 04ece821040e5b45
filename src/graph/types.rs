//! Core type definitions for the similarity graph

use crate::builder::PolicyConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How edge weights were computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    /// Cosine similarity, weights in [-1, 1]
    #[default]
    Cosine,
    /// Raw inner product of the embeddings, unbounded
    DotProduct,
}

impl SimilarityMeasure {
    /// Whether `threshold` lies in this measure's range
    pub fn accepts_threshold(&self, threshold: f32) -> bool {
        match self {
            SimilarityMeasure::Cosine => threshold.is_finite() && (-1.0..=1.0).contains(&threshold),
            SimilarityMeasure::DotProduct => threshold.is_finite(),
        }
    }

    /// Whether an edge weight of `weight` can be produced under this measure
    pub fn accepts_weight(&self, weight: f32) -> bool {
        self.accepts_threshold(weight)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMeasure::Cosine => "cosine",
            SimilarityMeasure::DotProduct => "dot_product",
        }
    }
}

impl fmt::Display for SimilarityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a graph's weights mean and which policy retained its edges.
///
/// `policy` is `None` for graphs re-imported from tables whose manifest was
/// not available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphProvenance {
    pub measure: SimilarityMeasure,
    pub policy: Option<PolicyConfig>,
}
