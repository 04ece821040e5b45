use simgraph::{
    BuildConfig, CancellationToken, ExportOptions, GraphImporter, GraphService, ServiceError,
    SyntheticCorpus, VectorStore,
};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn store() -> VectorStore {
    VectorStore::from_documents(
        SyntheticCorpus {
            documents: 200,
            dimension: 12,
            ..Default::default()
        }
        .generate(),
    )
    .unwrap()
}

#[test]
fn test_export_writes_snapshot_taken_at_spawn() {
    let dir = TempDir::new().unwrap();
    let store = store();
    let service = GraphService::new();
    let cancel = CancellationToken::new();

    service.rebuild(&store, &BuildConfig::knn(4), &cancel).unwrap();
    let first = service.current().unwrap();
    let export = service.spawn_export(dir.path(), ExportOptions::default()).unwrap();

    // Publishing a new build does not change what the running export writes
    service.rebuild(&store, &BuildConfig::threshold(0.95), &cancel).unwrap();
    assert_eq!(service.generation(), 2);

    let summary = export.join().unwrap().unwrap();
    assert_eq!(summary.edges, first.edge_count());
    let reloaded = GraphImporter::import_from_dir(dir.path(), &ExportOptions::default()).unwrap();
    assert_eq!(&reloaded, first.as_ref());
}

#[test]
fn test_analytics_concurrent_with_export() {
    let dir = TempDir::new().unwrap();
    let service = GraphService::new();
    service
        .rebuild(&store(), &BuildConfig::knn(5), &CancellationToken::new())
        .unwrap();

    let export = service.spawn_export(dir.path(), ExportOptions::default()).unwrap();
    let analytics = Arc::new(service.analytics().unwrap());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let analytics = Arc::clone(&analytics);
            thread::spawn(move || analytics.top_k_similar_pairs(10, None).unwrap())
        })
        .collect();

    let results: Vec<_> = readers.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    export.join().unwrap().unwrap();
}

#[test]
fn test_cancel_from_another_thread_keeps_previous_graph() {
    let store = store();
    let service = GraphService::new();
    service
        .rebuild(&store, &BuildConfig::threshold(0.9), &CancellationToken::new())
        .unwrap();
    let before = service.current().unwrap();

    let token = CancellationToken::new();
    let remote = token.clone();
    thread::spawn(move || remote.cancel()).join().unwrap();

    let err = service
        .rebuild(&store, &BuildConfig::knn(3).with_tile_size(1), &token)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Build(simgraph::BuildError::Cancelled)));
    assert!(Arc::ptr_eq(&before, &service.current().unwrap()));
}

#[test]
fn test_export_without_graph_fails() {
    let dir = TempDir::new().unwrap();
    let service = GraphService::new();
    assert!(matches!(
        service.spawn_export(dir.path(), ExportOptions::default()),
        Err(ServiceError::NotPublished)
    ));
}
