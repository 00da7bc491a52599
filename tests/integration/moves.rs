//! Move protocol end to end: round trips, cascades, overwrite policy, and
//! prefix-rewrite safety.

use crate::support::{engine, scope};
use treeline::{Catalog, EngineError, Position, ProjectId};

#[test]
fn move_round_trip_restores_parent_and_key_prefix() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "a/keep.txt", b"x").unwrap();
    engine.create_file(&scope, "b/other.txt", b"x").unwrap();
    let node = engine.create_file(&scope, "a/mover.txt", b"x").unwrap();

    let parent_a = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/a/")
        .unwrap()
        .unwrap();
    let parent_b = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/b/")
        .unwrap()
        .unwrap();

    engine
        .move_node(&scope, node.id, parent_b.id, Position::End)
        .unwrap();
    engine
        .move_node(&scope, node.id, parent_a.id, Position::End)
        .unwrap();

    let settled = engine.catalog().node(node.id).unwrap().unwrap();
    assert_eq!(settled.parent_id, Some(parent_a.id));
    assert!(settled.file_key.starts_with(&parent_a.file_key));
    assert_eq!(settled.file_key, "org/p1/ws/a/mover.txt");
}

#[test]
fn directory_move_rewrites_descendants_but_not_prefix_siblings() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "docs/a.txt", b"x").unwrap();
    engine.create_file(&scope, "docs/sub/b.txt", b"x").unwrap();
    // A sibling whose name merely starts with "docs" must survive untouched.
    let decoy = engine.create_file(&scope, "docs_report.txt", b"x").unwrap();
    engine.create_file(&scope, "archive/seed.txt", b"x").unwrap();

    let docs = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/docs/")
        .unwrap()
        .unwrap();
    let archive = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/archive/")
        .unwrap()
        .unwrap();

    engine
        .move_node(&scope, docs.id, archive.id, Position::End)
        .unwrap();

    let catalog = engine.catalog();
    assert!(catalog
        .node_by_key(ProjectId(1), "org/p1/ws/archive/docs/a.txt")
        .unwrap()
        .is_some());
    assert!(catalog
        .node_by_key(ProjectId(1), "org/p1/ws/archive/docs/sub/b.txt")
        .unwrap()
        .is_some());
    assert_eq!(
        catalog.node(decoy.id).unwrap().unwrap().file_key,
        "org/p1/ws/docs_report.txt"
    );
}

#[test]
fn directory_rename_rewrites_exactly_the_segment_prefix() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "docs/a.txt", b"x").unwrap();
    let decoy = engine.create_file(&scope, "docs_report.txt", b"x").unwrap();
    let docs = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/docs/")
        .unwrap()
        .unwrap();

    engine.rename_node(&scope, docs.id, "papers").unwrap();

    let catalog = engine.catalog();
    assert!(catalog
        .node_by_key(ProjectId(1), "org/p1/ws/papers/a.txt")
        .unwrap()
        .is_some());
    assert!(catalog
        .node_by_key(ProjectId(1), "org/p1/ws/docs/a.txt")
        .unwrap()
        .is_none());
    assert_eq!(
        catalog.node(decoy.id).unwrap().unwrap().file_key,
        "org/p1/ws/docs_report.txt"
    );
}

#[test]
fn move_overwrites_the_node_already_at_the_destination_key() {
    let engine = engine();
    let scope = scope();

    let incoming = engine.create_file(&scope, "src/report.txt", b"new").unwrap();
    let occupant = engine.create_file(&scope, "dst/report.txt", b"old").unwrap();
    let dst = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/dst/")
        .unwrap()
        .unwrap();

    engine
        .move_node(&scope, incoming.id, dst.id, Position::End)
        .unwrap();

    let catalog = engine.catalog();
    // Last writer wins: the occupant row is gone.
    assert!(catalog.node(occupant.id).unwrap().is_none());
    let winner = catalog
        .node_by_key(ProjectId(1), "org/p1/ws/dst/report.txt")
        .unwrap()
        .unwrap();
    assert_eq!(winner.id, incoming.id);
}

#[test]
fn move_into_own_subtree_is_rejected() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "top/mid/leaf.txt", b"x").unwrap();
    let top = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/top/")
        .unwrap()
        .unwrap();
    let mid = engine
        .catalog()
        .node_by_key(ProjectId(1), "org/p1/ws/top/mid/")
        .unwrap()
        .unwrap();

    let err = engine
        .move_node(&scope, top.id, mid.id, Position::End)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Nothing moved.
    assert_eq!(
        engine.catalog().node(top.id).unwrap().unwrap().file_key,
        "org/p1/ws/top/"
    );
}

#[test]
fn cross_project_move_is_rejected() {
    let engine = engine();
    let scope = scope();

    let node = engine.create_file(&scope, "a.txt", b"x").unwrap();
    let dir = engine.create_directory(&scope, "dest").unwrap();

    let foreign = treeline::ProjectScope::new(ProjectId(2), "org/p2/ws");
    let err = engine
        .move_node(&foreign, node.id, dir, Position::End)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
