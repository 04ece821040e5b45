//! Simgraph
//!
//! Document similarity graphs: build a weighted graph over a corpus of
//! embedded documents, export it as bulk-load tables for an external graph
//! store, and answer structural queries over it in process.
//!
//! # Architecture
//!
//! - `vector`: corpus storage (ids, titles, categories, embeddings) and TSV readers
//! - `builder`: tiled, parallel pair scoring under a construction policy
//!   (dense threshold or sparse kNN)
//! - `graph`: frozen graph snapshot with canonical, de-duplicated edges
//! - `export`: streaming `nodes.csv` / `edges.csv` writer, importer and manifest
//! - `analytics`: top pairs, category statistics, clique listing
//! - `service`: atomic publish of rebuilt graphs, background export
//!
//! Topology kernels (CSR view, bounded top-n, clique listing) live in the
//! `simgraph-algorithms` crate.
//!
//! ## Example Usage
//!
//! ```rust
//! use simgraph::{BuildConfig, Document, GraphAnalytics, SimilarityGraphBuilder, VectorStore};
//! use std::sync::Arc;
//!
//! let store = VectorStore::from_documents(vec![
//!     Document::new("a", "Alpha", vec!["cs.LG".into()], vec![1.0, 0.0]),
//!     Document::new("b", "Beta", vec!["cs.LG".into()], vec![0.9, 0.1]),
//!     Document::new("c", "Gamma", vec!["math.ST".into()], vec![0.0, 1.0]),
//! ])
//! .unwrap();
//!
//! let builder = SimilarityGraphBuilder::new(BuildConfig::threshold(0.9)).unwrap();
//! let output = builder.build(&store).unwrap();
//! assert_eq!(output.graph.edge_count(), 1);
//!
//! let analytics = GraphAnalytics::new(Arc::new(output.graph));
//! let top = analytics.top_k_similar_pairs(5, None).unwrap();
//! assert_eq!((top[0].source_id.as_str(), top[0].target_id.as_str()), ("a", "b"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod analytics;
pub mod builder;
pub mod export;
pub mod graph;
pub mod service;
pub mod vector;

// Re-export main types for convenience
pub use vector::{Document, DocumentRef, SyntheticCorpus, VectorError, VectorResult, VectorStore};

pub use builder::{
    BuildConfig, BuildError, BuildOutput, BuildResult, BuildStats, CancellationToken,
    GraphConstructionPolicy, PolicyConfig, SimilarityGraphBuilder,
};

pub use graph::{
    DocumentNode, Graph, GraphError, GraphProvenance, GraphResult, SimilarityEdge,
    SimilarityMeasure,
};

pub use export::{
    ExportError, ExportOptions, ExportResult, ExportSummary, GraphExporter, GraphImporter,
    GraphManifest,
};

pub use analytics::{
    compare_graphs, AnalyticsError, AnalyticsResult, CategoryFilter, Cluster, GraphAnalytics,
    GraphComparison, SimilarPair,
};

pub use service::{GraphService, ServiceError, ServiceResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
