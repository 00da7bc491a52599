//! Sibling ordering end to end: midpoint insertion, gap exhaustion, and the
//! rebalance that follows.

use crate::support::{engine, scope};
use std::collections::HashSet;
use treeline::{Position, SortKey};

#[test]
fn midpoint_insertion_lands_between_anchor_and_successor() {
    let engine = engine();
    let scope = scope();

    let a = engine.create_file(&scope, "a.txt", b"x").unwrap(); // sort 1024
    let b = engine.create_file(&scope, "b.txt", b"x").unwrap(); // sort 2048
    let c = engine.create_file(&scope, "c.txt", b"x").unwrap(); // sort 3072
    let parent = a.parent_id.unwrap();

    let repositioned = engine
        .reorder(&scope, c.id, Position::After(a.id))
        .unwrap();
    assert_eq!(repositioned.sort, 1536);

    let ordered: Vec<String> = engine
        .siblings(&scope, parent)
        .unwrap()
        .iter()
        .map(|n| n.name.clone())
        .collect();
    assert_eq!(ordered, vec!["a.txt", "c.txt", "b.txt"]);
    assert_eq!(b.sort, 2048);
}

#[test]
fn gap_exhaustion_rebalances_to_uniform_multiples() {
    let engine = engine();
    let scope = scope();

    let a = engine.create_file(&scope, "a.txt", b"x").unwrap(); // sort 1024
    engine.create_file(&scope, "b.txt", b"x").unwrap(); // sort 2048
    let parent = a.parent_id.unwrap();

    // Wedge files directly after a until the gap collapses. The gap halves
    // each round (1024, 512, ... 16, 8): the eighth insertion finds a gap of
    // 8 <= 10 and triggers the rebalance.
    let mut last_sort = 0;
    for i in 0..8 {
        let node = engine
            .create_file(&scope, &format!("mid{}.txt", i), b"x")
            .unwrap();
        let repositioned = engine
            .reorder(&scope, node.id, Position::After(a.id))
            .unwrap();
        last_sort = repositioned.sort;
    }

    // The rebalanced set is respaced to positive multiples of the step; the
    // pending insertion landed half a step after its anchor's fresh key.
    assert_eq!(last_sort, 1536);
    let siblings = engine.siblings(&scope, parent).unwrap();
    assert_eq!(siblings.len(), 10);
    for node in siblings.iter().filter(|n| n.sort != last_sort) {
        assert!(node.sort > 0 && node.sort % 1024 == 0, "sort {} not respaced", node.sort);
    }

    // Pre-rebalance relative order survives: a first, b last.
    let ordered: Vec<String> = siblings.iter().map(|n| n.name.clone()).collect();
    assert_eq!(ordered.first().unwrap(), "a.txt");
    assert_eq!(ordered.last().unwrap(), "b.txt");
}

#[test]
fn sibling_sorts_stay_pairwise_distinct_under_heavy_repositioning() {
    let engine = engine();
    let scope = scope();

    let first = engine.create_file(&scope, "f0.txt", b"x").unwrap();
    let parent = first.parent_id.unwrap();
    let mut anchor = first.id;

    // Chained "insert after the previous" repositioning, crossing several
    // rebalances along the way.
    for i in 1..40 {
        let node = engine
            .create_file(&scope, &format!("f{}.txt", i), b"x")
            .unwrap();
        engine
            .reorder(&scope, node.id, Position::After(anchor))
            .unwrap();
        anchor = node.id;
    }

    let siblings = engine.siblings(&scope, parent).unwrap();
    assert_eq!(siblings.len(), 40);

    let sorts: HashSet<SortKey> = siblings.iter().map(|n| n.sort).collect();
    assert_eq!(sorts.len(), 40, "sort keys must be pairwise distinct");
}

#[test]
fn reorder_to_beginning_halves_the_first_key() {
    let engine = engine();
    let scope = scope();

    engine.create_file(&scope, "a.txt", b"x").unwrap();
    let b = engine.create_file(&scope, "b.txt", b"x").unwrap();

    let repositioned = engine.reorder(&scope, b.id, Position::Beginning).unwrap();
    assert_eq!(repositioned.sort, 512);
}
