use anyhow::{Context, Result};
use simgraph::analytics::CategoryFilter;
use simgraph::vector::load_corpus;
use simgraph::{
    compare_graphs, BuildConfig, CancellationToken, ExportOptions, GraphAnalytics, GraphImporter,
    GraphService, SyntheticCorpus, VectorStore,
};
use std::env;
use std::path::PathBuf;

const DEMO_THRESHOLD: f32 = 0.95;
const DEMO_K: usize = 10;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Simgraph v{}", simgraph::version());
    println!("==========================================");
    println!();

    // Usage: simgraph [<documents.tsv> <vectors.tsv>] [out_dir]
    let args: Vec<String> = env::args().skip(1).collect();
    let (store, out_dir) = match args.as_slice() {
        [docs, vecs, rest @ ..] if rest.len() <= 1 => {
            let documents = load_corpus(docs, vecs)
                .with_context(|| format!("loading corpus from {} and {}", docs, vecs))?;
            (VectorStore::from_documents(documents)?, rest.first().map(PathBuf::from))
        }
        [out] => (synthetic_store()?, Some(PathBuf::from(out))),
        [] => (synthetic_store()?, None),
        _ => anyhow::bail!("usage: simgraph [<documents.tsv> <vectors.tsv>] [out_dir]"),
    };
    let out_dir = out_dir.unwrap_or_else(|| env::temp_dir().join("simgraph-demo"));

    println!(
        "✓ Loaded {} documents ({} dimensions)",
        store.len(),
        store.dimension().unwrap_or(0)
    );

    let service = GraphService::new();
    let cancel = CancellationToken::new();

    // Demo 1: dense-thresholded graph
    println!("\n=== Demo 1: Threshold graph (tau = {}) ===", DEMO_THRESHOLD);
    let stats = service.rebuild(&store, &BuildConfig::threshold(DEMO_THRESHOLD), &cancel)?;
    println!(
        "✓ {} edges from {} candidates in {:?} (density {:.6})",
        stats.edges, stats.candidate_edges, stats.elapsed, stats.density
    );
    let threshold_dir = out_dir.join("threshold");
    let export = service.spawn_export(&threshold_dir, ExportOptions::default())?;
    report(&service.analytics()?);
    let summary = export
        .join()
        .map_err(|_| anyhow::anyhow!("export thread panicked"))??;
    println!(
        "✓ Exported {} nodes / {} edges to {}",
        summary.nodes,
        summary.edges,
        threshold_dir.display()
    );

    // Demo 2: sparse kNN graph
    println!("\n=== Demo 2: kNN graph (k = {}) ===", DEMO_K);
    let stats = service.rebuild(&store, &BuildConfig::knn(DEMO_K), &cancel)?;
    println!(
        "✓ {} edges ({} pairs chosen from both sides) in {:?}",
        stats.edges, stats.duplicates_merged, stats.elapsed
    );
    let knn_dir = out_dir.join("knn");
    let export = service.spawn_export(&knn_dir, ExportOptions::default())?;
    report(&service.analytics()?);
    export
        .join()
        .map_err(|_| anyhow::anyhow!("export thread panicked"))??;

    // Demo 3: re-import
    println!("\n=== Demo 3: Re-import ===");
    let reloaded = GraphImporter::import_from_dir(&knn_dir, &ExportOptions::default())?;
    let current = service.current().context("no graph published")?;
    let diff = compare_graphs(&current, &reloaded, 0.0);
    println!(
        "✓ Re-imported {} nodes / {} edges, identical to the build: {}",
        reloaded.node_count(),
        reloaded.edge_count(),
        diff.is_equivalent()
    );

    println!("\n✅ Done. Tables written under {}", out_dir.display());
    Ok(())
}

fn synthetic_store() -> Result<VectorStore> {
    let corpus = SyntheticCorpus::default();
    println!(
        "No corpus given, generating {} synthetic documents (seed {})",
        corpus.documents, corpus.seed
    );
    Ok(VectorStore::from_documents(corpus.generate())?)
}

fn report(analytics: &GraphAnalytics) {
    println!("\nGraph Statistics:");
    println!("  Total nodes: {}", analytics.node_count());
    println!("  Total edges: {}", analytics.edge_count());

    if analytics.edge_count() == 0 {
        println!("  (no edges retained, skipping queries)");
        return;
    }

    if let Ok(rows) = analytics.category_distribution() {
        println!("\nCategory distribution:");
        for row in rows.iter().take(5) {
            println!("  {:<12} {}", row.category, row.documents);
        }
    }

    if let Ok(pairs) = analytics.top_k_similar_pairs(5, None) {
        println!("\nTop similar pairs:");
        for pair in pairs {
            println!(
                "  {:.4}  {} <-> {}",
                pair.similarity, pair.source_title, pair.target_title
            );
        }
    }

    let filter = CategoryFilter::any_of(["stat.ML"]);
    if let Ok(pairs) = analytics.top_k_similar_pairs(3, Some(&filter)) {
        println!("\nTop stat.ML pairs:");
        for pair in pairs {
            println!("  {:.4}  {} <-> {}", pair.similarity, pair.source_id, pair.target_id);
        }
    }

    if let Ok(rows) = analytics.cross_category_stats() {
        println!("\nCross-category similarity:");
        for row in rows {
            let relation = row.relation.to_string();
            match row.mean_similarity {
                Some(mean) => println!("  {:<20} {:>8} edges, mean {:.4}", relation, row.edges, mean),
                None => println!("  {:<20} {:>8} edges", relation, row.edges),
            }
        }
    }

    let threshold = analytics
        .top_k_similar_pairs(1, None)
        .ok()
        .and_then(|top| top.first().map(|p| p.similarity))
        .map_or(DEMO_THRESHOLD, |best| best.min(DEMO_THRESHOLD) - 0.02);
    match analytics.find_clusters(threshold, 3) {
        Ok(clusters) => {
            println!("\nTriangles above {:.3}: {}", threshold, clusters.len());
            for cluster in clusters.iter().take(3) {
                println!("  {:.4}  {:?}", cluster.mean_similarity, cluster.members);
            }
        }
        Err(e) => println!("\nCluster search failed: {}", e),
    }
}
