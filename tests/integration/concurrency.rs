//! Concurrent move serialization through the project lock and the sibling
//! row locks underneath it.

use crate::support::scope;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use treeline::{EngineConfig, Position, ProjectId, SortKey, TreeEngine};

#[test]
fn concurrent_moves_into_one_directory_never_collide_on_sort() {
    let engine = Arc::new(TreeEngine::in_memory(EngineConfig::default()));
    let scope = scope();

    let dest = engine.create_directory(&scope, "dest").unwrap();
    let mut ids = Vec::new();
    for i in 0..8 {
        let node = engine
            .create_file(&scope, &format!("src/f{}.txt", i), b"x")
            .unwrap();
        ids.push(node.id);
    }

    let mut handles = vec![];
    for id in ids {
        let engine = Arc::clone(&engine);
        let scope = scope.clone();
        handles.push(thread::spawn(move || {
            engine.move_node(&scope, id, dest, Position::End).unwrap()
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let siblings = engine.siblings(&scope, dest).unwrap();
    assert_eq!(siblings.len(), 8);
    let sorts: HashSet<SortKey> = siblings.iter().map(|n| n.sort).collect();
    assert_eq!(sorts.len(), 8, "concurrent moves produced colliding sorts");
}

#[test]
fn concurrent_reorders_keep_sorts_distinct() {
    let engine = Arc::new(TreeEngine::in_memory(EngineConfig::default()));
    let scope = scope();

    let first = engine.create_file(&scope, "f0.txt", b"x").unwrap();
    let parent = first.parent_id.unwrap();
    let mut ids = vec![first.id];
    for i in 1..8 {
        ids.push(
            engine
                .create_file(&scope, &format!("f{}.txt", i), b"x")
                .unwrap()
                .id,
        );
    }

    let mut handles = vec![];
    for id in ids {
        let engine = Arc::clone(&engine);
        let scope = scope.clone();
        handles.push(thread::spawn(move || {
            engine.reorder(&scope, id, Position::Beginning).unwrap()
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let siblings = engine.siblings(&scope, parent).unwrap();
    let sorts: HashSet<SortKey> = siblings.iter().map(|n| n.sort).collect();
    assert_eq!(sorts.len(), siblings.len());
}

#[test]
fn moves_in_different_projects_proceed_independently() {
    let engine = Arc::new(TreeEngine::in_memory(EngineConfig::default()));
    let scopes: Vec<_> = (1..=4)
        .map(|i| treeline::ProjectScope::new(ProjectId(i), format!("org/p{}/ws", i)))
        .collect();

    let mut handles = vec![];
    for scope in scopes {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let node = engine.create_file(&scope, "src/a.txt", b"x").unwrap();
            let dest = engine.create_directory(&scope, "dest").unwrap();
            let moved = engine
                .move_node(&scope, node.id, dest, Position::End)
                .unwrap();
            assert!(moved.file_key.ends_with("/dest/a.txt"));
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}
