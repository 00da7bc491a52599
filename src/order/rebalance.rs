//! Sibling set rebalancing
//!
//! When midpoint insertion runs out of room, every child of the parent is
//! reassigned a uniformly spaced key in one batch, then the pending
//! insertion's key is computed against the fresh spacing. Runs inside the
//! caller's transaction and project lock so no other writer observes a
//! rebalanced-but-not-yet-positioned state.

use crate::catalog::{CatalogTx, SiblingRow};
use crate::config::SortConfig;
use crate::error::CatalogError;
use crate::types::{NodeId, Position, ProjectId, SortKey};
use std::cmp::Ordering;
use tracing::{info, warn};

/// Business priority used when reassigning keys: nodes that already carry a
/// positive sort keep their relative order ahead of unsorted ones; among
/// unsorted nodes directories come first, then newest-first creation time.
/// Unsorted rows are legacy-migrated or resolver-created (`sort = 0`).
fn business_order(a: &SiblingRow, b: &SiblingRow) -> Ordering {
    let a_sorted = a.sort > 0;
    let b_sorted = b.sort > 0;
    if a_sorted != b_sorted {
        return b_sorted.cmp(&a_sorted);
    }
    if a_sorted && b_sorted {
        return a.sort.cmp(&b.sort).then_with(|| a.created_at.cmp(&b.created_at));
    }
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Reassign uniform keys to every child of `parent` and return the key for
/// the pending insertion at `position`.
pub fn rebalance(
    tx: &mut dyn CatalogTx,
    project: ProjectId,
    parent: Option<NodeId>,
    position: Position,
    cfg: &SortConfig,
) -> Result<SortKey, CatalogError> {
    let mut children = tx.lock_children_for_update(project, parent)?;
    if children.len() > cfg.rebalance_warn_threshold {
        warn!(
            project_id = %project,
            parent_id = ?parent,
            children = children.len(),
            "Rebalancing an unusually large sibling set"
        );
    }

    children.sort_by(business_order);

    let mut updates: Vec<(NodeId, SortKey)> = Vec::with_capacity(children.len());
    let mut next_key = cfg.default_step;
    for child in &children {
        updates.push((child.id, next_key));
        next_key += cfg.default_step;
    }
    tx.batch_update_sort(&updates)?;

    info!(
        project_id = %project,
        parent_id = ?parent,
        affected = updates.len(),
        gap_threshold = cfg.min_gap,
        "Sibling sort rebalance triggered"
    );

    // Key for the pending insertion against the fresh spacing.
    let key = match position {
        Position::Beginning => cfg.default_step / 2,
        Position::After(anchor) => updates
            .iter()
            .find(|(id, _)| *id == anchor)
            .map(|(_, sort)| sort + cfg.default_step / 2)
            // Anchor vanished between computation and rebalance: append.
            .unwrap_or(next_key),
        Position::End => next_key,
    };
    Ok(key)
}
