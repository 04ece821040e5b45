//! Frozen similarity graph
//!
//! A `Graph` is assembled once (by the builder or by re-importing exported
//! tables) and never mutated afterwards. Rebuilding means constructing a new
//! `Graph` and publishing it in place of the old one.

use super::edge::SimilarityEdge;
use super::node::DocumentNode;
use super::types::{GraphProvenance, SimilarityMeasure};
use thiserror::Error;

/// Errors that can occur while assembling or reading a graph
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Document {0} not found")]
    NodeNotFound(String),

    #[error("Duplicate document id: {0}")]
    DuplicateNode(String),

    #[error("Node list is not sorted by id at {0}")]
    UnsortedNodes(String),

    #[error("Invalid edge: endpoint {0} does not exist")]
    DanglingEdge(u32),

    #[error("Invalid edge: self-loop on {0}")]
    SelfLoop(String),

    #[error("Invalid edge list: ({0}, {1}) is not in canonical sorted position")]
    UnsortedEdge(String, String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Borrowed edge with resolved endpoint ids
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRef<'a> {
    pub source: &'a DocumentNode,
    pub target: &'a DocumentNode,
    pub weight: f32,
}

/// Document set plus undirected similarity edge set.
///
/// Invariants:
/// - `nodes` is sorted by id, ids are unique
/// - every edge has `source < target < nodes.len()`
/// - `edges` is sorted by (source, target) with no repeated pair
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: Vec<DocumentNode>,
    edges: Vec<SimilarityEdge>,
    provenance: GraphProvenance,
}

impl Graph {
    /// Assemble a graph from id-sorted nodes and canonical sorted edges.
    pub fn new(
        nodes: Vec<DocumentNode>,
        edges: Vec<SimilarityEdge>,
        provenance: GraphProvenance,
    ) -> GraphResult<Self> {
        for pair in nodes.windows(2) {
            if pair[0].id >= pair[1].id {
                return Err(if pair[0].id == pair[1].id {
                    GraphError::DuplicateNode(pair[1].id.clone())
                } else {
                    GraphError::UnsortedNodes(pair[1].id.clone())
                });
            }
        }

        let node_count = nodes.len();
        let mut previous: Option<(u32, u32)> = None;
        for edge in &edges {
            for endpoint in [edge.source, edge.target] {
                if endpoint as usize >= node_count {
                    return Err(GraphError::DanglingEdge(endpoint));
                }
            }
            if edge.source == edge.target {
                return Err(GraphError::SelfLoop(nodes[edge.source as usize].id.clone()));
            }
            let key = (edge.source, edge.target);
            if edge.source > edge.target || previous.map_or(false, |p| p >= key) {
                return Err(GraphError::UnsortedEdge(
                    nodes[edge.source as usize].id.clone(),
                    nodes[edge.target as usize].id.clone(),
                ));
            }
            previous = Some(key);
        }

        Ok(Graph {
            nodes,
            edges,
            provenance,
        })
    }

    /// Graph with nodes and no edges
    pub fn without_edges(mut nodes: Vec<DocumentNode>, provenance: GraphProvenance) -> GraphResult<Self> {
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Self::new(nodes, Vec::new(), provenance)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes sorted by id
    pub fn nodes(&self) -> &[DocumentNode] {
        &self.nodes
    }

    /// Edges sorted by (source id, target id)
    pub fn edges(&self) -> &[SimilarityEdge] {
        &self.edges
    }

    /// Node at a dense index
    pub fn node(&self, index: u32) -> Option<&DocumentNode> {
        self.nodes.get(index as usize)
    }

    /// Dense index of a document id
    pub fn index_of(&self, id: &str) -> Option<u32> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|i| i as u32)
    }

    /// Look up a node by document id
    pub fn get_node(&self, id: &str) -> GraphResult<&DocumentNode> {
        self.index_of(id)
            .and_then(|i| self.node(i))
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Edges with endpoint documents resolved, in canonical order
    pub fn edge_refs(&self) -> impl Iterator<Item = EdgeRef<'_>> + '_ {
        self.edges.iter().map(move |e| self.resolve(e))
    }

    /// Resolve the endpoints of an edge of this graph
    pub fn resolve(&self, edge: &SimilarityEdge) -> EdgeRef<'_> {
        EdgeRef {
            source: &self.nodes[edge.source as usize],
            target: &self.nodes[edge.target as usize],
            weight: edge.weight,
        }
    }

    pub fn provenance(&self) -> &GraphProvenance {
        &self.provenance
    }

    pub fn measure(&self) -> SimilarityMeasure {
        self.provenance.measure
    }
}
