//! Published graph holder
//!
//! Keeps the current graph snapshot behind an `Arc` and replaces it only when
//! a rebuild finishes. Readers never observe a half-built graph: a failed or
//! cancelled rebuild leaves the previous snapshot in place.

use crate::analytics::{AnalyticsError, GraphAnalytics};
use crate::builder::{BuildConfig, BuildError, BuildStats, CancellationToken, SimilarityGraphBuilder};
use crate::export::{ExportError, ExportOptions, ExportResult, ExportSummary, GraphExporter};
use crate::graph::Graph;
use crate::vector::{VectorError, VectorStore};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No graph has been published yet")]
    NotPublished,

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Vector store error: {0}")]
    Vector(#[from] VectorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone)]
struct Published {
    graph: Arc<Graph>,
    generation: u64,
}

/// Owner of the published graph
#[derive(Debug, Default)]
pub struct GraphService {
    published: RwLock<Option<Published>>,
}

impl GraphService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh graph from `store` and publish it.
    ///
    /// The previous graph stays published if the build fails or is cancelled.
    pub fn rebuild(
        &self,
        store: &VectorStore,
        config: &BuildConfig,
        cancel: &CancellationToken,
    ) -> ServiceResult<BuildStats> {
        let builder = SimilarityGraphBuilder::new(config.clone())?;
        let output = match builder.build_with_cancel(store, cancel) {
            Ok(output) => output,
            Err(e) => {
                warn!("Rebuild failed, keeping generation {}: {}", self.generation(), e);
                return Err(e.into());
            }
        };
        self.publish(output.graph);
        Ok(output.stats)
    }

    /// Swap in `graph` as the current snapshot; returns its generation
    pub fn publish(&self, graph: Graph) -> u64 {
        let mut slot = self.published.write().unwrap_or_else(|e| e.into_inner());
        let generation = slot.as_ref().map_or(1, |p| p.generation + 1);
        info!(
            "Publishing graph generation {} ({} nodes, {} edges)",
            generation,
            graph.node_count(),
            graph.edge_count()
        );
        *slot = Some(Published {
            graph: Arc::new(graph),
            generation,
        });
        generation
    }

    /// The published snapshot, if any
    pub fn current(&self) -> Option<Arc<Graph>> {
        self.read().map(|p| p.graph)
    }

    /// Number of graphs published so far
    pub fn generation(&self) -> u64 {
        self.read().map_or(0, |p| p.generation)
    }

    pub fn analytics(&self) -> ServiceResult<GraphAnalytics> {
        let graph = self.current().ok_or(ServiceError::NotPublished)?;
        Ok(GraphAnalytics::new(graph))
    }

    /// Export the published snapshot on a dedicated thread.
    ///
    /// The thread holds its own reference to the snapshot, so a rebuild
    /// published meanwhile does not affect what gets written.
    pub fn spawn_export(
        &self,
        dir: impl Into<PathBuf>,
        options: ExportOptions,
    ) -> ServiceResult<JoinHandle<ExportResult<ExportSummary>>> {
        let graph = self.current().ok_or(ServiceError::NotPublished)?;
        let dir = dir.into();
        let handle = thread::Builder::new()
            .name("simgraph-export".to_string())
            .spawn(move || GraphExporter::with_options(options).export_to_dir(&graph, dir))?;
        Ok(handle)
    }

    fn read(&self) -> Option<Published> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Document;

    fn store() -> VectorStore {
        VectorStore::from_documents(vec![
            Document::new("a", "A", vec!["x".into()], vec![1.0, 0.0]),
            Document::new("b", "B", vec!["x".into()], vec![0.9, 0.1]),
            Document::new("c", "C", vec!["y".into()], vec![0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_nothing_published_initially() {
        let service = GraphService::new();
        assert!(service.current().is_none());
        assert_eq!(service.generation(), 0);
        assert!(matches!(service.analytics(), Err(ServiceError::NotPublished)));
    }

    #[test]
    fn test_rebuild_publishes_new_generation() {
        let service = GraphService::new();
        let token = CancellationToken::new();
        service.rebuild(&store(), &BuildConfig::threshold(0.9), &token).unwrap();
        assert_eq!(service.generation(), 1);
        assert_eq!(service.current().unwrap().edge_count(), 1);

        service.rebuild(&store(), &BuildConfig::knn(1), &token).unwrap();
        assert_eq!(service.generation(), 2);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_graph() {
        let service = GraphService::new();
        service
            .rebuild(&store(), &BuildConfig::threshold(0.9), &CancellationToken::new())
            .unwrap();
        let before = service.current().unwrap();

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let err = service
            .rebuild(&store(), &BuildConfig::knn(2), &cancelled)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Build(BuildError::Cancelled)));

        let err = service
            .rebuild(&VectorStore::new(), &BuildConfig::knn(2), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Build(BuildError::EmptyCorpus)));

        assert_eq!(service.generation(), 1);
        assert!(Arc::ptr_eq(&before, &service.current().unwrap()));
    }
}
