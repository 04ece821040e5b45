//! Streaming table writer
//!
//! Rows are produced lazily from the frozen graph and written straight through
//! a buffered CSV writer, so no table is ever held in memory as a whole. Row
//! order follows the graph's canonical order (nodes by id, edges by source id
//! then target id), which makes the output byte-identical across runs.

use super::manifest::GraphManifest;
use super::{ExportOptions, ExportResult, DOCUMENT_LABEL, EDGE_COLUMNS, NODE_COLUMNS, SIMILARITY_TYPE};
use crate::graph::Graph;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// One row of the node table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub category: String,
    pub label: &'static str,
}

/// One row of the edge table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRow<'a> {
    pub start_id: &'a str,
    pub end_id: &'a str,
    pub similarity: f32,
    pub edge_type: &'static str,
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub nodes: usize,
    pub edges: usize,
    pub nodes_path: Option<PathBuf>,
    pub edges_path: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Serialises graphs into bulk-load tables
#[derive(Debug, Clone, Default)]
pub struct GraphExporter {
    options: ExportOptions,
}

impl GraphExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Node table rows, by id
    pub fn node_rows(graph: &Graph) -> impl Iterator<Item = NodeRow<'_>> + '_ {
        graph.nodes().iter().map(|node| NodeRow {
            id: &node.id,
            title: &node.title,
            category: node.category_field(),
            label: DOCUMENT_LABEL,
        })
    }

    /// Edge table rows, by (source id, target id)
    pub fn edge_rows(graph: &Graph) -> impl Iterator<Item = EdgeRow<'_>> + '_ {
        graph.edge_refs().map(|edge| EdgeRow {
            start_id: &edge.source.id,
            end_id: &edge.target.id,
            similarity: edge.weight,
            edge_type: SIMILARITY_TYPE,
        })
    }

    /// Write the node table (header included); returns the number of data rows
    pub fn write_nodes<W: Write>(&self, graph: &Graph, writer: W) -> ExportResult<usize> {
        let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
        csv.write_record(NODE_COLUMNS)?;
        let mut rows = 0;
        for row in Self::node_rows(graph) {
            csv.serialize(row)?;
            rows += 1;
        }
        csv.flush()?;
        Ok(rows)
    }

    /// Write the edge table (header included); returns the number of data rows
    pub fn write_edges<W: Write>(&self, graph: &Graph, writer: W) -> ExportResult<usize> {
        let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
        csv.write_record(EDGE_COLUMNS)?;
        let mut rows = 0;
        for row in Self::edge_rows(graph) {
            csv.serialize(row)?;
            rows += 1;
        }
        csv.flush()?;
        Ok(rows)
    }

    /// Write both tables to the given writers
    pub fn export<N: Write, E: Write>(
        &self,
        graph: &Graph,
        nodes: N,
        edges: E,
    ) -> ExportResult<ExportSummary> {
        let started = Instant::now();
        let node_rows = self.write_nodes(graph, nodes)?;
        let edge_rows = self.write_edges(graph, edges)?;
        Ok(ExportSummary {
            nodes: node_rows,
            edges: edge_rows,
            nodes_path: None,
            edges_path: None,
            elapsed: started.elapsed(),
        })
    }

    /// Write both tables and the manifest into `dir`, creating it if needed
    pub fn export_to_dir(&self, graph: &Graph, dir: impl AsRef<Path>) -> ExportResult<ExportSummary> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let nodes_path = dir.join(&self.options.nodes_file);
        let edges_path = dir.join(&self.options.edges_file);

        info!("Exporting graph to {:?}", dir);
        let mut summary = self.export(
            graph,
            BufWriter::new(File::create(&nodes_path)?),
            BufWriter::new(File::create(&edges_path)?),
        )?;
        GraphManifest::for_graph(graph).write_to(dir.join(&self.options.manifest_file))?;

        info!(
            "Exported {} nodes and {} edges in {:?}",
            summary.nodes, summary.edges, summary.elapsed
        );
        summary.nodes_path = Some(nodes_path);
        summary.edges_path = Some(edges_path);
        Ok(summary)
    }
}
