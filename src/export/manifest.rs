//! Export manifest
//!
//! Small JSON document written next to the tables so a re-import knows what
//! the weights mean and can check that both tables are complete.

use super::{ExportResult, EDGE_COLUMNS, NODE_COLUMNS};
use crate::graph::{Graph, GraphProvenance};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const MANIFEST_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphManifest {
    pub format_version: u32,
    pub node_count: usize,
    pub edge_count: usize,
    pub provenance: GraphProvenance,
    pub node_columns: Vec<String>,
    pub edge_columns: Vec<String>,
}

impl GraphManifest {
    pub fn for_graph(graph: &Graph) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            provenance: graph.provenance().clone(),
            node_columns: NODE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            edge_columns: EDGE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> ExportResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> ExportResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
