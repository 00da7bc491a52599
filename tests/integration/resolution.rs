//! Directory materialization through the engine surface.

use crate::support::{engine, scope};
use treeline::{Catalog, EngineError, ProjectId};

#[test]
fn ensure_path_is_idempotent_and_creates_each_level_once() {
    let engine = engine();
    let scope = scope();

    let first = engine.create_directory(&scope, "a/b/c").unwrap();
    let second = engine.create_directory(&scope, "a/b/c").unwrap();
    assert_eq!(first, second);

    // Root plus exactly three directory rows, not six.
    let catalog = engine.catalog();
    for key in ["org/p1/ws/a/", "org/p1/ws/a/b/", "org/p1/ws/a/b/c/"] {
        assert!(catalog.node_by_key(ProjectId(1), key).unwrap().is_some());
    }
    let under_root = catalog
        .descendants_by_prefix(ProjectId(1), "org/p1/ws/")
        .unwrap();
    assert_eq!(under_root.len(), 3);
}

#[test]
fn creating_a_file_reuses_directories_made_for_an_earlier_sibling() {
    let engine = engine();
    let scope = scope();

    let a = engine.create_file(&scope, "shared/deep/a.txt", b"x").unwrap();
    let b = engine.create_file(&scope, "shared/deep/b.txt", b"x").unwrap();
    assert_eq!(a.parent_id, b.parent_id);
}

#[test]
fn resolution_fails_fast_when_a_segment_is_a_file() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "blocker", b"x").unwrap();
    let err = engine.create_directory(&scope, "blocker/child").unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn root_directory_is_hidden_and_unordered() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "a.txt", b"x").unwrap();
    let root = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/")
        .unwrap()
        .unwrap();
    assert!(root.is_directory);
    assert!(root.is_hidden);
    assert_eq!(root.parent_id, None);
    assert_eq!(root.sort, 0);
}

#[test]
fn projects_do_not_share_roots() {
    let engine = engine();
    let scope_one = scope();
    let scope_two = treeline::ProjectScope::new(ProjectId(2), "org/p2/ws");

    engine.create_file(&scope_one, "a.txt", b"x").unwrap();
    engine.create_file(&scope_two, "a.txt", b"x").unwrap();

    let catalog = engine.catalog();
    let one = catalog.node_by_key(ProjectId(1), "org/p1/ws/a.txt").unwrap();
    let two = catalog.node_by_key(ProjectId(2), "org/p2/ws/a.txt").unwrap();
    assert!(one.is_some());
    assert!(two.is_some());
    assert_ne!(one.unwrap().parent_id, two.unwrap().parent_id);
}
