//! Bulk-load export and re-import
//!
//! A graph is written as two comma-separated tables that a graph store's bulk
//! importer consumes directly:
//! - `nodes.csv`: `id,title,category,:LABEL`
//! - `edges.csv`: `:START_ID,:END_ID,similarity,:TYPE`
//!
//! plus a `graph.json` manifest recording counts and what the weights mean.
//! The same files load back into a [`Graph`](crate::graph::Graph) without
//! recomputing any similarity.

pub mod manifest;
pub mod reader;
pub mod writer;

pub use manifest::{GraphManifest, MANIFEST_FORMAT_VERSION};
pub use reader::GraphImporter;
pub use writer::{EdgeRow, ExportSummary, GraphExporter, NodeRow};

use crate::graph::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node table header, in column order
pub const NODE_COLUMNS: [&str; 4] = ["id", "title", "category", ":LABEL"];

/// Edge table header, in column order
pub const EDGE_COLUMNS: [&str; 4] = [":START_ID", ":END_ID", "similarity", ":TYPE"];

/// Label carried by every node row
pub const DOCUMENT_LABEL: &str = "Document";

/// Relationship type carried by every edge row
pub const SIMILARITY_TYPE: &str = "SIMILAR_TO";

/// Export / import errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Inconsistent weights for pair ({source_id}, {target_id}): {first} vs {second}")]
    Consistency {
        source_id: String,
        target_id: String,
        first: f32,
        second: f32,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// File names used inside an export directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub nodes_file: String,
    pub edges_file: String,
    pub manifest_file: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            nodes_file: "nodes.csv".to_string(),
            edges_file: "edges.csv".to_string(),
            manifest_file: "graph.json".to_string(),
        }
    }
}
