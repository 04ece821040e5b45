//! In-process graph analytics
//!
//! Structural queries over a frozen [`Graph`] snapshot. The graph is shared
//! through an `Arc`, so any number of analytics instances (and a concurrent
//! export) can read the same build.
//!
//! Neighbor-based queries run on the CSR view from `simgraph-algorithms`,
//! built once per instance; threshold-restricted queries build a filtered view
//! on demand.

pub mod compare;
pub mod rows;

pub use compare::{compare_graphs, GraphComparison, WeightMismatch};
pub use rows::{
    CategoryCount, CategoryFilter, CategoryRelation, Cluster, CrossCategoryRow, DegreeStats,
    NeighborRow, SimilarPair,
};

use crate::graph::{Graph, SimilarityEdge};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use simgraph_algorithms::{enumerate_cliques, GraphView, TopN};
use std::cmp::{Ordering, Reverse};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Edges per partial sum in the cross-category statistic
const STATS_CHUNK: usize = 64 * 1024;

/// Analytics errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Graph has no edges")]
    EmptyGraph,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Document not found: {0}")]
    NotFound(String),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Ranking of an edge: higher weight first, then smaller (source, target).
///
/// Node indices follow id order, so index order is id order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PairRank {
    weight: f32,
    source: u32,
    target: u32,
}

impl From<&SimilarityEdge> for PairRank {
    fn from(edge: &SimilarityEdge) -> Self {
        PairRank {
            weight: edge.weight + 0.0,
            source: edge.source,
            target: edge.target,
        }
    }
}

impl Eq for PairRank {}

impl Ord for PairRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| (other.source, other.target).cmp(&(self.source, self.target)))
    }
}

impl PartialOrd for PairRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Query layer over one graph snapshot
#[derive(Debug, Clone)]
pub struct GraphAnalytics {
    graph: Arc<Graph>,
    view: GraphView,
}

impl GraphAnalytics {
    pub fn new(graph: Arc<Graph>) -> Self {
        let view = GraphView::from_edges(
            graph.node_count(),
            graph
                .edges()
                .iter()
                .map(|e| (e.source as usize, e.target as usize, e.weight)),
        );
        Self { graph, view }
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn require_edges(&self) -> AnalyticsResult<()> {
        if self.graph.edge_count() == 0 {
            return Err(AnalyticsError::EmptyGraph);
        }
        Ok(())
    }

    fn check_threshold(&self, threshold: f32) -> AnalyticsResult<()> {
        let measure = self.graph.measure();
        if !measure.accepts_threshold(threshold) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "threshold {} is outside the {} range",
                threshold, measure
            )));
        }
        Ok(())
    }

    /// View restricted to edges with weight strictly above `threshold`
    fn view_above(&self, threshold: f32) -> GraphView {
        GraphView::from_edges(
            self.graph.node_count(),
            self.graph
                .edges()
                .iter()
                .filter(|e| e.weight > threshold)
                .map(|e| (e.source as usize, e.target as usize, e.weight)),
        )
    }

    /// Documents per category, count descending then label ascending
    pub fn category_distribution(&self) -> AnalyticsResult<Vec<CategoryCount>> {
        self.require_edges()?;

        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        for node in self.graph.nodes() {
            for category in &node.categories {
                *counts.entry(category.as_str()).or_insert(0) += 1;
            }
        }

        let mut rows: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, documents)| CategoryCount {
                category: category.to_string(),
                documents,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.documents
                .cmp(&a.documents)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(rows)
    }

    /// The `n` heaviest edges, weight descending then (source id, target id)
    /// ascending.
    ///
    /// With a filter only edges whose both endpoints match are considered.
    /// Asking for more pairs than exist returns all of them.
    pub fn top_k_similar_pairs(
        &self,
        n: usize,
        filter: Option<&CategoryFilter>,
    ) -> AnalyticsResult<Vec<SimilarPair>> {
        self.require_edges()?;
        if n == 0 {
            return Err(AnalyticsError::InvalidParameter("n must be at least 1".to_string()));
        }

        let nodes = self.graph.nodes();
        let eligible: Option<Vec<bool>> =
            filter.map(|f| nodes.par_iter().map(|node| f.matches(node)).collect());

        let best = self
            .graph
            .edges()
            .par_iter()
            .filter(|e| match &eligible {
                Some(ok) => ok[e.source as usize] && ok[e.target as usize],
                None => true,
            })
            .fold(
                || TopN::new(n),
                |mut top, edge| {
                    top.push(PairRank::from(edge));
                    top
                },
            )
            .reduce(|| TopN::new(n), TopN::merge);

        Ok(best
            .into_sorted_vec()
            .into_iter()
            .map(|rank| {
                let source = &nodes[rank.source as usize];
                let target = &nodes[rank.target as usize];
                SimilarPair {
                    source_id: source.id.clone(),
                    source_title: source.title.clone(),
                    target_id: target.id.clone(),
                    target_title: target.title.clone(),
                    similarity: rank.weight,
                }
            })
            .collect())
    }

    /// Edge count and mean weight for same-category and different-category
    /// edges, in that order.
    pub fn cross_category_stats(&self) -> AnalyticsResult<Vec<CrossCategoryRow>> {
        self.require_edges()?;

        let nodes = self.graph.nodes();
        // Fixed chunks summed in order keep the means independent of scheduling
        let partials: Vec<[(usize, f64); 2]> = self
            .graph
            .edges()
            .par_chunks(STATS_CHUNK)
            .map(|chunk| {
                let mut acc = [(0usize, 0f64); 2];
                for edge in chunk {
                    let same = nodes[edge.source as usize].shares_category(&nodes[edge.target as usize]);
                    let slot = &mut acc[if same { 0 } else { 1 }];
                    slot.0 += 1;
                    slot.1 += f64::from(edge.weight);
                }
                acc
            })
            .collect();

        let mut totals = [(0usize, 0f64); 2];
        for partial in partials {
            for (total, part) in totals.iter_mut().zip(partial) {
                total.0 += part.0;
                total.1 += part.1;
            }
        }

        Ok([CategoryRelation::Same, CategoryRelation::Different]
            .into_iter()
            .zip(totals)
            .map(|(relation, (edges, sum))| CrossCategoryRow {
                relation,
                edges,
                mean_similarity: (edges > 0).then(|| sum / edges as f64),
            })
            .collect())
    }

    /// Every set of exactly `min_size` documents that are pairwise joined by
    /// edges heavier than `threshold`.
    ///
    /// Clusters are ordered by mean pairwise weight descending, then by member
    /// ids ascending.
    pub fn find_clusters(&self, threshold: f32, min_size: usize) -> AnalyticsResult<Vec<Cluster>> {
        self.require_edges()?;
        self.check_threshold(threshold)?;
        if min_size < 3 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "min_size must be at least 3, got {}",
                min_size
            )));
        }

        let view = self.view_above(threshold);
        let cliques = enumerate_cliques(&view, min_size);
        debug!(
            "{} cliques of size {} above {} ({} filtered edges)",
            cliques.len(),
            min_size,
            threshold,
            view.edge_count()
        );

        let nodes = self.graph.nodes();
        let mut clusters: Vec<Cluster> = cliques
            .into_par_iter()
            .map(|members| {
                let mut sum = 0f64;
                let mut pairs = 0usize;
                for (i, &u) in members.iter().enumerate() {
                    for &v in &members[i + 1..] {
                        sum += view.weight_between(u, v).map(f64::from).unwrap_or_default();
                        pairs += 1;
                    }
                }
                Cluster {
                    members: members.iter().map(|&m| nodes[m].id.clone()).collect(),
                    categories: members.iter().map(|&m| nodes[m].categories.clone()).collect(),
                    mean_similarity: sum / pairs as f64,
                }
            })
            .collect();

        clusters.sort_by(|a, b| {
            b.mean_similarity
                .total_cmp(&a.mean_similarity)
                .then_with(|| a.members.cmp(&b.members))
        });
        Ok(clusters)
    }

    /// The `n` strongest neighbors of `id`, weight descending then id ascending
    pub fn neighbors(&self, id: &str, n: usize) -> AnalyticsResult<Vec<NeighborRow>> {
        self.require_edges()?;
        if n == 0 {
            return Err(AnalyticsError::InvalidParameter("n must be at least 1".to_string()));
        }
        let index = self
            .graph
            .index_of(id)
            .ok_or_else(|| AnalyticsError::NotFound(id.to_string()))? as usize;

        let mut top = TopN::new(n);
        for (&v, &w) in self.view.neighbors(index).iter().zip(self.view.weights(index)) {
            top.push((OrderedWeight(w), Reverse(v)));
        }

        let nodes = self.graph.nodes();
        Ok(top
            .into_sorted_vec()
            .into_iter()
            .map(|(OrderedWeight(w), Reverse(v))| NeighborRow {
                id: nodes[v].id.clone(),
                title: nodes[v].title.clone(),
                similarity: w,
            })
            .collect())
    }

    pub fn degree_stats(&self) -> AnalyticsResult<DegreeStats> {
        self.require_edges()?;

        let degrees = (0..self.view.node_count).map(|u| self.view.degree(u));
        let min = degrees.clone().min().unwrap_or(0);
        let max = degrees.clone().max().unwrap_or(0);
        let isolated = degrees.filter(|&d| d == 0).count();
        Ok(DegreeStats {
            min,
            max,
            mean: 2.0 * self.graph.edge_count() as f64 / self.graph.node_count() as f64,
            isolated,
        })
    }

    /// Number of triangles among edges heavier than `threshold`
    pub fn count_triangles(&self, threshold: f32) -> AnalyticsResult<usize> {
        self.require_edges()?;
        self.check_threshold(threshold)?;
        Ok(simgraph_algorithms::count_triangles(&self.view_above(threshold)))
    }
}

/// Total order on `f32` for heap keys
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedWeight(f32);

impl Eq for OrderedWeight {}

impl Ord for OrderedWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0 + 0.0).total_cmp(&(other.0 + 0.0))
    }
}

impl PartialOrd for OrderedWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
