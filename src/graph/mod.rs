//! Similarity graph data model
//!
//! - Document nodes (id, title, categories) sorted by id
//! - Undirected weighted edges, one per unordered pair, canonically ordered
//! - Provenance recording what the weights mean

pub mod edge;
pub mod node;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::{merge_candidates, CandidateEdge, EdgeMergeError, MergedEdges, SimilarityEdge, WEIGHT_TOLERANCE};
pub use node::DocumentNode;
pub use store::{EdgeRef, Graph, GraphError, GraphResult};
pub use types::{GraphProvenance, SimilarityMeasure};
