use simgraph::analytics::CategoryRelation;
use simgraph::{
    AnalyticsError, BuildConfig, CategoryFilter, Graph, GraphAnalytics, SimilarityGraphBuilder,
    SyntheticCorpus, VectorStore,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn knn_analytics(k: usize) -> GraphAnalytics {
    let store = VectorStore::from_documents(
        SyntheticCorpus {
            documents: 150,
            dimension: 8,
            noise: 0.5,
            seed: 17,
            ..Default::default()
        }
        .generate(),
    )
    .unwrap();
    let graph = SimilarityGraphBuilder::new(BuildConfig::knn(k))
        .unwrap()
        .build(&store)
        .unwrap()
        .graph;
    GraphAnalytics::new(Arc::new(graph))
}

/// Triangles by checking every triple of nodes
fn brute_force_triangles(graph: &Graph, threshold: f32) -> BTreeSet<Vec<String>> {
    let n = graph.node_count();
    let mut adjacent = vec![vec![false; n]; n];
    for e in graph.edges().iter().filter(|e| e.weight > threshold) {
        adjacent[e.source as usize][e.target as usize] = true;
        adjacent[e.target as usize][e.source as usize] = true;
    }

    let mut out = BTreeSet::new();
    for a in 0..n {
        for b in (a + 1)..n {
            if !adjacent[a][b] {
                continue;
            }
            for c in (b + 1)..n {
                if adjacent[a][c] && adjacent[b][c] {
                    out.insert(
                        [a, b, c]
                            .iter()
                            .map(|&i| graph.nodes()[i].id.clone())
                            .collect(),
                    );
                }
            }
        }
    }
    out
}

#[test]
fn test_find_clusters_matches_brute_force() {
    let analytics = knn_analytics(8);
    for threshold in [0.8f32, 0.9, 0.95] {
        let clusters = analytics.find_clusters(threshold, 3).unwrap();
        let found: BTreeSet<Vec<String>> = clusters.iter().map(|c| c.members.clone()).collect();
        assert_eq!(found.len(), clusters.len(), "duplicate cluster at {}", threshold);
        assert_eq!(found, brute_force_triangles(analytics.graph(), threshold));
        assert_eq!(analytics.count_triangles(threshold).unwrap(), clusters.len());

        // Mean weight descending
        assert!(clusters
            .windows(2)
            .all(|w| w[0].mean_similarity >= w[1].mean_similarity));
    }
}

#[test]
fn test_larger_cliques_contain_triangles() {
    let analytics = knn_analytics(10);
    let triangles: BTreeSet<Vec<String>> = analytics
        .find_clusters(0.8, 3)
        .unwrap()
        .into_iter()
        .map(|c| c.members)
        .collect();

    for clique in analytics.find_clusters(0.8, 4).unwrap() {
        assert_eq!(clique.size(), 4);
        for skip in 0..4 {
            let sub: Vec<String> = clique
                .members
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, id)| id.clone())
                .collect();
            assert!(triangles.contains(&sub));
        }
    }
}

#[test]
fn test_top_k_matches_full_sort() {
    let analytics = knn_analytics(5);
    let graph = analytics.graph();
    let mut all: Vec<(f32, String, String)> = graph
        .edge_refs()
        .map(|e| (e.weight, e.source.id.clone(), e.target.id.clone()))
        .collect();
    all.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| (&a.1, &a.2).cmp(&(&b.1, &b.2))));

    for n in [1, 7, 50, all.len(), all.len() + 10] {
        let top = analytics.top_k_similar_pairs(n, None).unwrap();
        assert_eq!(top.len(), n.min(all.len()));
        for (row, expected) in top.iter().zip(&all) {
            assert_eq!((row.similarity, &row.source_id, &row.target_id), (expected.0, &expected.1, &expected.2));
        }
    }
}

#[test]
fn test_filtered_top_k_only_matching_endpoints() {
    let analytics = knn_analytics(5);
    let filter = CategoryFilter::any_of(["cs.LG", "stat.ML"]);
    let top = analytics.top_k_similar_pairs(20, Some(&filter)).unwrap();
    assert!(!top.is_empty());

    let graph = analytics.graph();
    for pair in &top {
        for id in [&pair.source_id, &pair.target_id] {
            let node = graph.get_node(id).unwrap();
            assert!(filter.matches(node), "{} does not match the filter", id);
        }
    }
}

#[test]
fn test_cross_category_partitions_all_edges() {
    let analytics = knn_analytics(5);
    let rows = analytics.cross_category_stats().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].relation, CategoryRelation::Same);
    assert_eq!(rows[0].edges + rows[1].edges, analytics.edge_count());

    let same = analytics
        .graph()
        .edge_refs()
        .filter(|e| e.source.shares_category(e.target))
        .count();
    assert_eq!(rows[0].edges, same);

    // Stable across calls
    assert_eq!(rows, analytics.cross_category_stats().unwrap());
}

#[test]
fn test_category_distribution_counts_every_label() {
    let analytics = knn_analytics(3);
    let rows = analytics.category_distribution().unwrap();
    let labelled: usize = analytics.graph().nodes().iter().map(|n| n.categories.len()).sum();
    assert_eq!(rows.iter().map(|r| r.documents).sum::<usize>(), labelled);
    assert!(rows
        .windows(2)
        .all(|w| (w[1].documents, &w[0].category) <= (w[0].documents, &w[1].category)));
}

#[test]
fn test_neighbors_sorted() {
    let analytics = knn_analytics(5);
    let id = analytics.graph().nodes()[0].id.clone();
    let rows = analytics.neighbors(&id, 100).unwrap();
    assert!(rows.len() >= 5);
    assert!(rows.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert!(matches!(analytics.neighbors(&id, 0), Err(AnalyticsError::InvalidParameter(_))));
}
