//! Similarity graph construction
//!
//! Turns a [`VectorStore`] into a [`Graph`] under one of two policies:
//! - dense-thresholded: every pair with similarity above `tau`
//! - sparse kNN: each document's `k` most similar documents
//!
//! The embedding matrix is scored in row tiles on a fixed pool of workers.
//! Each worker keeps only the pairs its policy retains, the per-tile partitions
//! are merged once at the end, and the full pair matrix is never materialised.

pub mod cancel;
pub mod config;
pub mod kernel;
pub mod policy;

pub use cancel::CancellationToken;
pub use config::{BuildConfig, PolicyConfig, DEFAULT_TILE_SIZE};
pub use policy::{DenseThreshold, GraphConstructionPolicy, ScoredTile, SparseKnn};

use crate::graph::{
    merge_candidates, CandidateEdge, DocumentNode, EdgeMergeError, Graph, GraphError,
    GraphProvenance, SimilarityMeasure,
};
use crate::vector::{VectorError, VectorStore};
use ndarray::s;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while configuring or running a build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Cannot build a graph from an empty corpus")]
    EmptyCorpus,

    #[error("Invalid threshold {tau} for {measure} similarity")]
    InvalidThreshold {
        tau: f32,
        measure: SimilarityMeasure,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Inconsistent weights for pair ({source_id}, {target_id}): {first} vs {second}")]
    Consistency {
        source_id: String,
        target_id: String,
        first: f32,
        second: f32,
    },

    #[error("Similarity of ({source_id}, {target_id}) is not finite under {measure}")]
    NonFiniteScore {
        source_id: String,
        target_id: String,
        measure: SimilarityMeasure,
    },

    #[error("Build cancelled")]
    Cancelled,

    #[error("Worker pool error: {0}")]
    ThreadPool(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vector store error: {0}")]
    Vector(#[from] VectorError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Counters describing one build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildStats {
    pub documents: usize,
    pub tiles: usize,
    /// Pairs retained by the policy before de-duplication
    pub candidate_edges: usize,
    pub edges: usize,
    /// Candidates folded into a pair already discovered from the other side
    pub duplicates_merged: usize,
    /// Edges over possible unordered pairs
    pub density: f64,
    pub elapsed: Duration,
}

/// A finished build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: Graph,
    pub stats: BuildStats,
}

/// Builds similarity graphs under a fixed configuration
#[derive(Debug)]
pub struct SimilarityGraphBuilder {
    config: BuildConfig,
    policy: Box<dyn GraphConstructionPolicy>,
    pool: Option<rayon::ThreadPool>,
}

impl SimilarityGraphBuilder {
    /// Validate the configuration and set up the worker pool
    pub fn new(config: BuildConfig) -> BuildResult<Self> {
        config.validate()?;

        let pool = match config.workers {
            Some(workers) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("simgraph-worker-{}", i))
                    .build()
                    .map_err(|e| BuildError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            policy: config.policy.instantiate(),
            config,
            pool,
        })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a graph, running to completion
    pub fn build(&self, store: &VectorStore) -> BuildResult<BuildOutput> {
        self.build_with_cancel(store, &CancellationToken::new())
    }

    /// Build a graph, checking `cancel` before every tile.
    ///
    /// On cancellation or any error no graph is returned.
    pub fn build_with_cancel(
        &self,
        store: &VectorStore,
        cancel: &CancellationToken,
    ) -> BuildResult<BuildOutput> {
        let started = Instant::now();
        if store.is_empty() {
            return Err(BuildError::EmptyCorpus);
        }
        let n = store.len();
        if n > u32::MAX as usize {
            return Err(BuildError::InvalidParameter(format!(
                "corpus of {} documents exceeds the addressable node count",
                n
            )));
        }

        let matrix = kernel::prepare_matrix(store.matrix()?, self.config.measure);
        let (order, rank) = id_order(store);
        let tile_size = self.config.tile_size;
        let tile_starts: Vec<usize> = (0..n).step_by(tile_size).collect();
        let tiles = tile_starts.len();

        info!(
            "Building similarity graph: {} documents, policy {}, measure {}, {} tiles of {} rows",
            n, self.config.policy, self.config.measure, tiles, tile_size
        );

        let policy = self.policy.as_ref();
        let measure = self.config.measure;
        let completed = AtomicUsize::new(0);
        let score_tiles = || -> BuildResult<Vec<Vec<CandidateEdge>>> {
            tile_starts
                .par_iter()
                .map(|&row_start| {
                    cancel.check()?;
                    let row_end = (row_start + tile_size).min(n);
                    let col_start = policy.first_column(row_start);
                    let scores = kernel::score_tile(
                        matrix.slice(s![row_start..row_end, ..]),
                        matrix.slice(s![col_start.., ..]),
                        measure,
                    );
                    if let Some((a, b)) = kernel::first_non_finite(scores.view(), row_start, col_start) {
                        return Err(non_finite_score(store, a, b, measure));
                    }

                    let mut retained = Vec::new();
                    policy.select(
                        &ScoredTile {
                            row_start,
                            col_start,
                            scores: scores.view(),
                            rank: &rank,
                        },
                        &mut retained,
                    );

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(
                        "Tile {}/{} (rows {}..{}): {} pairs retained",
                        done,
                        tiles,
                        row_start,
                        row_end,
                        retained.len()
                    );
                    Ok(retained)
                })
                .collect()
        };

        let partitions = match &self.pool {
            Some(pool) => pool.install(score_tiles),
            None => score_tiles(),
        };
        let partitions = match partitions.and_then(|p| cancel.check().map(|()| p)) {
            Ok(p) => p,
            Err(BuildError::Cancelled) => {
                warn!("Build cancelled after {} of {} tiles", completed.load(Ordering::Relaxed), tiles);
                return Err(BuildError::Cancelled);
            }
            Err(e) => return Err(e),
        };

        let candidate_edges: usize = partitions.iter().map(Vec::len).sum();
        let mut candidates = Vec::with_capacity(candidate_edges);
        for partition in partitions {
            candidates.extend(partition);
        }

        let nodes: Vec<DocumentNode> = order
            .iter()
            .filter_map(|&i| store.document(i))
            .map(DocumentNode::from)
            .collect();

        let merged = merge_candidates(candidates).map_err(|e| match e {
            EdgeMergeError::SelfLoop(node) => {
                BuildError::Graph(GraphError::SelfLoop(nodes[node as usize].id.clone()))
            }
            EdgeMergeError::WeightMismatch {
                source,
                target,
                first,
                second,
            } => BuildError::Consistency {
                source_id: nodes[source as usize].id.clone(),
                target_id: nodes[target as usize].id.clone(),
                first,
                second,
            },
        })?;

        let provenance = GraphProvenance {
            measure: self.config.measure,
            policy: Some(self.policy.describe()),
        };
        let duplicates_merged = merged.duplicates;
        let graph = Graph::new(nodes, merged.edges, provenance)?;

        let possible_pairs = (n as f64) * (n as f64 - 1.0) / 2.0;
        let stats = BuildStats {
            documents: n,
            tiles,
            candidate_edges,
            edges: graph.edge_count(),
            duplicates_merged,
            density: if possible_pairs > 0.0 {
                graph.edge_count() as f64 / possible_pairs
            } else {
                0.0
            },
            elapsed: started.elapsed(),
        };

        info!(
            "Built graph: {} nodes, {} edges ({} candidates, {} merged, density {:.6}) in {:?}",
            graph.node_count(),
            stats.edges,
            stats.candidate_edges,
            stats.duplicates_merged,
            stats.density,
            stats.elapsed
        );

        Ok(BuildOutput { graph, stats })
    }
}

/// Error for an overflowed score between store rows `a` and `b`, endpoints in id order
fn non_finite_score(store: &VectorStore, a: usize, b: usize, measure: SimilarityMeasure) -> BuildError {
    let id = |row: usize| store.document(row).map(|d| d.id.to_string()).unwrap_or_default();
    let (source_id, target_id) = match (id(a), id(b)) {
        (x, y) if x <= y => (x, y),
        (x, y) => (y, x),
    };
    BuildError::NonFiniteScore {
        source_id,
        target_id,
        measure,
    }
}

/// Store rows sorted by id (`order[r]` is the row with the r-th smallest id)
/// and the inverse (`rank[row]`).
fn id_order(store: &VectorStore) -> (Vec<usize>, Vec<u32>) {
    let ids: Vec<&str> = store.ids().collect();
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.par_sort_unstable_by(|&a, &b| ids[a].cmp(ids[b]));

    let mut rank = vec![0u32; ids.len()];
    for (r, &row) in order.iter().enumerate() {
        rank[row] = r as u32;
    }
    (order, rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Document;

    fn store(docs: &[(&str, Vec<f32>)]) -> VectorStore {
        VectorStore::from_documents(
            docs.iter()
                .map(|(id, v)| Document::new(*id, format!("Paper {}", id), vec!["stat.ML".into()], v.clone())),
        )
        .unwrap()
    }

    fn pairs(graph: &Graph) -> Vec<(String, String)> {
        graph
            .edge_refs()
            .map(|e| (e.source.id.clone(), e.target.id.clone()))
            .collect()
    }

    #[test]
    fn test_empty_corpus() {
        let builder = SimilarityGraphBuilder::new(BuildConfig::threshold(0.5)).unwrap();
        assert!(matches!(
            builder.build(&VectorStore::new()),
            Err(BuildError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        assert!(matches!(
            SimilarityGraphBuilder::new(BuildConfig::threshold(-1.5)),
            Err(BuildError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            SimilarityGraphBuilder::new(BuildConfig::knn(0)),
            Err(BuildError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_threshold_build_orders_endpoints_by_id() {
        // Loaded out of id order on purpose
        let store = store(&[
            ("c", vec![1.0, 0.0]),
            ("a", vec![0.99, 0.05]),
            ("b", vec![0.0, 1.0]),
        ]);
        let builder = SimilarityGraphBuilder::new(BuildConfig::threshold(0.9)).unwrap();
        let output = builder.build(&store).unwrap();

        assert_eq!(pairs(&output.graph), vec![("a".to_string(), "c".to_string())]);
        assert_eq!(output.graph.node_count(), 3);
        assert_eq!(output.stats.duplicates_merged, 0);
        assert_eq!(
            output.graph.provenance().policy,
            Some(PolicyConfig::Threshold { tau: 0.9 })
        );
    }

    #[test]
    fn test_knn_tie_prefers_smaller_id() {
        let store = store(&[
            ("q", vec![1.0, 0.0, 0.0]),
            ("z", vec![1.0, 1.0, 0.0]),
            ("m", vec![1.0, 1.0, 0.0]),
        ]);
        let builder = SimilarityGraphBuilder::new(BuildConfig::knn(1)).unwrap();
        let output = builder.build(&store).unwrap();

        // q picks m over z (tie), z and m pick each other
        assert_eq!(
            pairs(&output.graph),
            vec![
                ("m".to_string(), "q".to_string()),
                ("m".to_string(), "z".to_string()),
            ]
        );
        assert_eq!(output.stats.candidate_edges, 3);
        assert_eq!(output.stats.duplicates_merged, 1);
    }

    #[test]
    fn test_tiling_does_not_change_result() {
        let docs: Vec<(String, Vec<f32>)> = (0..23)
            .map(|i| {
                let x = i as f32;
                (format!("d{:02}", i), vec![(x * 0.7).sin().abs(), (x * 1.3).cos().abs(), 0.5])
            })
            .collect();
        let refs: Vec<(&str, Vec<f32>)> = docs.iter().map(|(id, v)| (id.as_str(), v.clone())).collect();
        let store = store(&refs);

        let whole = SimilarityGraphBuilder::new(BuildConfig::threshold(0.95).with_tile_size(1000))
            .unwrap()
            .build(&store)
            .unwrap();
        let tiled = SimilarityGraphBuilder::new(BuildConfig::threshold(0.95).with_tile_size(4).with_workers(3))
            .unwrap()
            .build(&store)
            .unwrap();

        assert_eq!(pairs(&whole.graph), pairs(&tiled.graph));
        assert_eq!(tiled.stats.tiles, 6);
    }

    #[test]
    fn test_cancelled_build_returns_nothing() {
        let store = store(&[("a", vec![1.0]), ("b", vec![1.0])]);
        let token = CancellationToken::new();
        token.cancel();
        let builder = SimilarityGraphBuilder::new(BuildConfig::knn(1)).unwrap();
        assert!(matches!(
            builder.build_with_cancel(&store, &token),
            Err(BuildError::Cancelled)
        ));
    }

    #[test]
    fn test_identical_embeddings_never_exceed_unit_cosine() {
        let v: Vec<f32> = (1..=300).map(|i| (i as f32 * 0.37).sin()).collect();
        let store = store(&[("a", v.clone()), ("b", v.clone()), ("c", v)]);

        let strict = SimilarityGraphBuilder::new(BuildConfig::threshold(1.0)).unwrap();
        assert_eq!(strict.build(&store).unwrap().graph.edge_count(), 0);

        let output = SimilarityGraphBuilder::new(BuildConfig::knn(2)).unwrap().build(&store).unwrap();
        assert_eq!(output.graph.edge_count(), 3);
        assert!(output.graph.edges().iter().all(|e| e.weight <= 1.0));
    }

    #[test]
    fn test_overflowing_dot_product_rejected() {
        let store = store(&[
            ("b", vec![3e38, 3e38]),
            ("a", vec![3e38, 3e38]),
            ("c", vec![0.0, 1.0]),
        ]);
        let builder = SimilarityGraphBuilder::new(
            BuildConfig::threshold(0.0).with_measure(SimilarityMeasure::DotProduct),
        )
        .unwrap();
        match builder.build(&store) {
            Err(BuildError::NonFiniteScore {
                source_id,
                target_id,
                measure,
            }) => {
                assert_eq!((source_id.as_str(), target_id.as_str()), ("a", "b"));
                assert_eq!(measure, SimilarityMeasure::DotProduct);
            }
            other => panic!("expected a non-finite score error, got {:?}", other.map(|o| o.stats)),
        }

        // The same vectors are fine under cosine
        let cosine = SimilarityGraphBuilder::new(BuildConfig::threshold(0.5)).unwrap();
        assert_eq!(cosine.build(&store).unwrap().graph.edge_count(), 1);
    }

    #[test]
    fn test_overflowing_self_score_ignored() {
        let store = store(&[("a", vec![3e38, 3e38]), ("b", vec![0.0, 1.0])]);
        let builder = SimilarityGraphBuilder::new(
            BuildConfig::knn(1).with_measure(SimilarityMeasure::DotProduct),
        )
        .unwrap();
        let graph = builder.build(&store).unwrap().graph;
        assert_eq!(graph.edges()[0].weight, 3e38);
    }
}
