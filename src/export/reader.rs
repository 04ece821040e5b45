//! Table importer
//!
//! Loads a node table and an edge table back into a [`Graph`]. Rows may come
//! in any order and edges in either orientation; the result is canonical.

use super::manifest::GraphManifest;
use super::{
    ExportError, ExportOptions, ExportResult, DOCUMENT_LABEL, EDGE_COLUMNS, MANIFEST_FORMAT_VERSION,
    NODE_COLUMNS, SIMILARITY_TYPE,
};
use crate::graph::{
    merge_candidates, CandidateEdge, DocumentNode, EdgeMergeError, Graph, GraphProvenance,
    SimilarityMeasure,
};
use crate::vector::CATEGORY_DELIMITER;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: String,
    title: String,
    category: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    start_id: String,
    end_id: String,
    similarity: f32,
    edge_type: String,
}

/// Reads bulk-load tables back into a graph
pub struct GraphImporter;

impl GraphImporter {
    /// Read both tables; `provenance` is attached to the resulting graph as-is
    pub fn read<N: Read, E: Read>(nodes: N, edges: E, provenance: GraphProvenance) -> ExportResult<Graph> {
        let mut nodes = read_nodes(nodes)?;
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = nodes.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(ExportError::Schema(format!("duplicate node id '{}'", pair[0].id)));
        }

        let candidates = read_edges(edges, &nodes, provenance.measure)?;
        let merged = merge_candidates(candidates).map_err(|e| match e {
            EdgeMergeError::SelfLoop(index) => {
                ExportError::Schema(format!("self-loop on '{}'", nodes[index as usize].id))
            }
            EdgeMergeError::WeightMismatch {
                source,
                target,
                first,
                second,
            } => ExportError::Consistency {
                source_id: nodes[source as usize].id.clone(),
                target_id: nodes[target as usize].id.clone(),
                first,
                second,
            },
        })?;
        if merged.duplicates > 0 {
            debug!("Merged {} repeated edge rows", merged.duplicates);
        }

        Ok(Graph::new(nodes, merged.edges, provenance)?)
    }

    /// Load an export directory written by [`GraphExporter::export_to_dir`].
    ///
    /// When the manifest is present its provenance is used and its counts are
    /// checked against the tables; without one the graph carries default
    /// provenance.
    ///
    /// [`GraphExporter::export_to_dir`]: super::GraphExporter::export_to_dir
    pub fn import_from_dir(dir: impl AsRef<Path>, options: &ExportOptions) -> ExportResult<Graph> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(&options.manifest_file);
        let manifest = if manifest_path.exists() {
            let manifest = GraphManifest::read_from(&manifest_path)?;
            if manifest.format_version != MANIFEST_FORMAT_VERSION {
                return Err(ExportError::Schema(format!(
                    "unsupported manifest version {}",
                    manifest.format_version
                )));
            }
            Some(manifest)
        } else {
            warn!("No manifest at {:?}, importing with default provenance", manifest_path);
            None
        };

        let provenance = manifest
            .as_ref()
            .map(|m| m.provenance.clone())
            .unwrap_or_default();
        let graph = Self::read(
            BufReader::new(File::open(dir.join(&options.nodes_file))?),
            BufReader::new(File::open(dir.join(&options.edges_file))?),
            provenance,
        )?;

        if let Some(manifest) = manifest {
            if manifest.node_count != graph.node_count() || manifest.edge_count != graph.edge_count() {
                return Err(ExportError::Schema(format!(
                    "manifest lists {} nodes / {} edges, tables hold {} / {}",
                    manifest.node_count,
                    manifest.edge_count,
                    graph.node_count(),
                    graph.edge_count()
                )));
            }
        }

        info!(
            "Imported {} nodes and {} edges from {:?}",
            graph.node_count(),
            graph.edge_count(),
            dir
        );
        Ok(graph)
    }
}

fn check_header(found: &StringRecord, expected: &[&str], table: &str) -> ExportResult<()> {
    if found.iter().ne(expected.iter().copied()) {
        return Err(ExportError::Schema(format!(
            "{} table header is [{}], expected [{}]",
            table,
            found.iter().collect::<Vec<_>>().join(","),
            expected.join(",")
        )));
    }
    Ok(())
}

fn read_nodes<R: Read>(reader: R) -> ExportResult<Vec<DocumentNode>> {
    let mut csv = ReaderBuilder::new().has_headers(false).from_reader(reader);
    let mut records = csv.records();
    let header = records
        .next()
        .ok_or_else(|| ExportError::Schema("node table is empty".to_string()))??;
    check_header(&header, &NODE_COLUMNS, "node")?;

    let mut nodes = Vec::new();
    for (line, record) in records.enumerate() {
        let row: NodeRecord = record?.deserialize(None)?;
        if row.label != DOCUMENT_LABEL {
            return Err(ExportError::Schema(format!(
                "node row {}: label '{}', expected '{}'",
                line + 2,
                row.label,
                DOCUMENT_LABEL
            )));
        }
        if row.id.is_empty() {
            return Err(ExportError::Schema(format!("node row {}: empty id", line + 2)));
        }
        let categories = row
            .category
            .split(CATEGORY_DELIMITER)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        nodes.push(DocumentNode::new(row.id, row.title, categories));
    }
    Ok(nodes)
}

fn read_edges<R: Read>(
    reader: R,
    nodes: &[DocumentNode],
    measure: SimilarityMeasure,
) -> ExportResult<Vec<CandidateEdge>> {
    let index_of = |id: &str, line: usize| -> ExportResult<u32> {
        nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .map(|i| i as u32)
            .map_err(|_| ExportError::Schema(format!("edge row {}: unknown node '{}'", line, id)))
    };

    let mut csv = ReaderBuilder::new().has_headers(false).from_reader(reader);
    let mut records = csv.records();
    let header = records
        .next()
        .ok_or_else(|| ExportError::Schema("edge table is empty".to_string()))??;
    check_header(&header, &EDGE_COLUMNS, "edge")?;

    let mut candidates = Vec::new();
    for (line, record) in records.enumerate() {
        let line = line + 2;
        let row: EdgeRecord = record?.deserialize(None)?;
        if row.edge_type != SIMILARITY_TYPE {
            return Err(ExportError::Schema(format!(
                "edge row {}: type '{}', expected '{}'",
                line, row.edge_type, SIMILARITY_TYPE
            )));
        }
        if !measure.accepts_weight(row.similarity) {
            return Err(ExportError::Schema(format!(
                "edge row {}: similarity {} outside the {} range",
                line, row.similarity, measure
            )));
        }
        candidates.push(CandidateEdge {
            from: index_of(&row.start_id, line)?,
            to: index_of(&row.end_id, line)?,
            weight: row.similarity,
        });
    }
    Ok(candidates)
}
