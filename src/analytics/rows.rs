//! Tabular query results
//!
//! Every analytic query returns plain rows of named fields so reporting code
//! can render them without knowing anything about the graph internals.

use crate::graph::DocumentNode;
use serde::Serialize;
use std::fmt;

/// Number of documents carrying one category label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub documents: usize,
}

/// One retained edge with both endpoints resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPair {
    pub source_id: String,
    pub source_title: String,
    pub target_id: String,
    pub target_title: String,
    pub similarity: f32,
}

/// Whether an edge joins documents that share a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryRelation {
    Same,
    Different,
}

impl fmt::Display for CategoryRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryRelation::Same => write!(f, "same category"),
            CategoryRelation::Different => write!(f, "different category"),
        }
    }
}

/// Edge count and mean weight of one partition.
///
/// `mean_similarity` is `None` when the partition holds no edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossCategoryRow {
    pub relation: CategoryRelation,
    pub edges: usize,
    pub mean_similarity: Option<f64>,
}

/// Pairwise-connected document set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Member ids, ascending
    pub members: Vec<String>,
    /// Categories of each member, aligned with `members`
    pub categories: Vec<Vec<String>>,
    pub mean_similarity: f64,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// One neighbor of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborRow {
    pub id: String,
    pub title: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    /// Nodes without any edge
    pub isolated: usize,
}

/// Restricts pair queries to documents carrying any of the listed categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    categories: Vec<String>,
}

impl CategoryFilter {
    pub fn any_of<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn matches(&self, node: &DocumentNode) -> bool {
        self.categories.iter().any(|c| node.has_category(c))
    }
}
