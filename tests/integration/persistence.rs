//! Catalog snapshot round trips through sled.

use crate::support::scope;
use std::sync::Arc;
use treeline::catalog::persistence::SnapshotStore;
use treeline::{
    Catalog, EngineConfig, LocalLockService, MemoryCatalog, MemoryStorage, Position, ProjectId,
    SequentialIds, TreeEngine,
};

#[test]
fn snapshot_survives_reload_with_order_intact() {
    let dir = tempfile::tempdir().unwrap();
    let scope = scope();

    let engine = TreeEngine::in_memory(EngineConfig::default());
    engine.create_file(&scope, "docs/a.txt", b"x").unwrap();
    engine.create_file(&scope, "docs/b.txt", b"x").unwrap();
    let c = engine.create_file(&scope, "docs/c.txt", b"x").unwrap();
    engine.reorder(&scope, c.id, Position::Beginning).unwrap();

    // Persist whatever the engine built.
    let snapshot = {
        let catalog: &Arc<dyn treeline::Catalog> = engine.catalog();
        let docs = catalog
            .node_by_key(ProjectId(1), "org/p1/ws/docs/")
            .unwrap()
            .unwrap();
        let mut rows = vec![
            catalog.node_by_key(ProjectId(1), "org/p1/ws/").unwrap().unwrap(),
            docs.clone(),
        ];
        for sibling in catalog.siblings(ProjectId(1), Some(docs.id)).unwrap() {
            rows.push(catalog.node(sibling.id).unwrap().unwrap());
        }
        rows
    };
    let store = SnapshotStore::open(&dir.path().join("catalog")).unwrap();
    store.save(&snapshot).unwrap();

    // Rebuild an engine over the reloaded catalog and keep operating.
    let reloaded = store.load_catalog().unwrap();
    let next_id = reloaded.max_id().map(|id| id.0 + 1).unwrap_or(1);
    let config = EngineConfig::default();
    let locks = Arc::new(LocalLockService::new(&config.lock));
    let engine = TreeEngine::new(
        Arc::new(reloaded),
        Arc::new(MemoryStorage::new()),
        locks,
        Arc::new(SequentialIds::starting_at(next_id)),
        config,
    );

    let docs = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/docs/")
        .unwrap()
        .unwrap();
    let names: Vec<String> = engine
        .siblings(&scope, docs.id)
        .unwrap()
        .iter()
        .map(|n| n.name.clone())
        .collect();
    assert_eq!(names, vec!["c.txt", "a.txt", "b.txt"]);

    // The reloaded catalog still takes ordinary operations.
    let d = engine.create_file(&scope, "docs/d.txt", b"x").unwrap();
    assert!(d.id.0 >= next_id);
}

#[test]
fn empty_store_loads_an_empty_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::open(&dir.path().join("catalog")).unwrap();
    let catalog: MemoryCatalog = store.load_catalog().unwrap();
    assert!(catalog.is_empty());
}
