//! Move protocol
//!
//! A move runs end-to-end under a project-scoped lock: validate, lock the
//! destination sibling set, resolve a sort key (rebalancing when the gap is
//! exhausted), overwrite any node already at the destination key, issue the
//! best-effort physical rename, persist parent/sort/key atomically, release
//! the lock. The catalog is authoritative; a failed physical rename is logged
//! and the move proceeds.

use crate::catalog::{Catalog, Node, NodePatch};
use crate::config::{LockConfig, SortConfig};
use crate::error::EngineError;
use crate::lock::LockService;
use crate::order::{compute_sort, rebalance, SortOutcome};
use crate::pathkey;
use crate::storage::Storage;
use crate::tree::rewrite::rewrite_descendant_keys;
use crate::types::{NodeId, Position, ProjectScope};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Parent-chain hop limit for the descendant-cycle check. A chain longer than
/// this is treated as corrupted and the move fails closed.
const MAX_ANCESTRY_HOPS: usize = 4096;

/// Releases the project move lock on every exit path. A failed release means
/// the lock expired and was taken over; that is logged, not surfaced.
struct ProjectLockGuard<'a> {
    locks: &'a dyn LockService,
    key: String,
    owner: String,
}

impl Drop for ProjectLockGuard<'_> {
    fn drop(&mut self) {
        if !self.locks.release(&self.key, &self.owner) {
            error!(
                lock_key = %self.key,
                lock_owner = %self.owner,
                "Failed to release project move lock"
            );
        }
    }
}

pub struct MoveCoordinator {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn Storage>,
    locks: Arc<dyn LockService>,
    sort: SortConfig,
    lock: LockConfig,
}

impl MoveCoordinator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn Storage>,
        locks: Arc<dyn LockService>,
        sort: SortConfig,
        lock: LockConfig,
    ) -> Self {
        Self {
            catalog,
            storage,
            locks,
            sort,
            lock,
        }
    }

    /// Move a node under `dest_parent`, inserting at `position` among its new
    /// siblings. Moving to the key the node already has is a no-op.
    pub fn move_node(
        &self,
        scope: &ProjectScope,
        node_id: NodeId,
        dest_parent_id: NodeId,
        position: Position,
    ) -> Result<Node, EngineError> {
        let node = self
            .catalog
            .node(node_id)?
            .ok_or_else(|| EngineError::NotFound(format!("node {}", node_id)))?;
        let dest_parent = self
            .catalog
            .node(dest_parent_id)?
            .ok_or_else(|| EngineError::NotFound(format!("target parent {}", dest_parent_id)))?;

        // Structural validation happens before any lock or transaction.
        if node.parent_id.is_none() {
            return Err(EngineError::Validation(
                "the project root cannot be moved".to_string(),
            ));
        }
        if !dest_parent.is_directory {
            return Err(EngineError::Validation(format!(
                "target parent {} is not a directory",
                dest_parent_id
            )));
        }
        if node.project_id != scope.id || dest_parent.project_id != scope.id {
            return Err(EngineError::Validation(
                "move may not cross project boundaries".to_string(),
            ));
        }
        self.reject_descendant_destination(node_id, dest_parent_id)?;

        let leaf = pathkey::basename(&node.file_key).to_string();
        let dest_key = if node.is_directory {
            pathkey::normalize_dir_key(&pathkey::join(&dest_parent.file_key, &leaf))
        } else {
            pathkey::join(&dest_parent.file_key, &leaf)
        };
        if !pathkey::is_within(&scope.work_root, &dest_key) {
            return Err(EngineError::Validation(format!(
                "destination key outside project work root: {}",
                dest_key
            )));
        }
        if dest_key == node.file_key {
            return Ok(node);
        }

        let _guard = self.acquire_project_lock(scope)?;

        let mut tx = self.catalog.begin()?;
        let children = tx.lock_children_for_update(scope.id, Some(dest_parent_id))?;

        let new_sort = match compute_sort(&children, position, &self.sort) {
            SortOutcome::Key(key) => key,
            SortOutcome::NeedsRebalance => rebalance(
                tx.as_mut(),
                scope.id,
                Some(dest_parent_id),
                position,
                &self.sort,
            )?,
        };

        // A node already at the destination key is overwritten, not merged.
        if let Some(occupant) = tx.node_by_key(scope.id, &dest_key)? {
            if occupant.id != node.id {
                warn!(
                    project_id = %scope.id,
                    occupant_id = %occupant.id,
                    file_key = %dest_key,
                    "Move overwrites existing node at destination key"
                );
                tx.delete(occupant.id)?;
            }
        }

        if let Err(err) = self
            .storage
            .rename_object(&scope.work_root, &node.file_key, &dest_key)
        {
            warn!(
                src_key = %node.file_key,
                dst_key = %dest_key,
                error = %err,
                "Physical rename failed during move; catalog update proceeds"
            );
        }

        let rewritten = if node.is_directory {
            rewrite_descendant_keys(tx.as_mut(), scope.id, &node.file_key, &dest_key)?
        } else {
            0
        };

        let now = Utc::now();
        tx.update_node(
            node.id,
            NodePatch {
                parent_id: Some(Some(dest_parent_id)),
                sort: Some(new_sort),
                file_key: Some(dest_key.clone()),
                updated_at: Some(now),
                ..NodePatch::default()
            },
        )?;
        tx.commit()?;

        info!(
            project_id = %scope.id,
            node_id = %node.id,
            target_parent_id = %dest_parent_id,
            new_sort,
            descendants_rewritten = rewritten,
            "Move operation completed"
        );

        let mut moved = node;
        moved.parent_id = Some(dest_parent_id);
        moved.sort = new_sort;
        moved.file_key = dest_key;
        moved.updated_at = now;
        Ok(moved)
    }

    /// Reposition a node among its current siblings without changing its
    /// parent or key.
    pub fn reorder(
        &self,
        scope: &ProjectScope,
        node_id: NodeId,
        position: Position,
    ) -> Result<Node, EngineError> {
        let node = self
            .catalog
            .node(node_id)?
            .ok_or_else(|| EngineError::NotFound(format!("node {}", node_id)))?;
        let Some(parent_id) = node.parent_id else {
            return Err(EngineError::Validation(
                "the project root cannot be reordered".to_string(),
            ));
        };
        if node.project_id != scope.id {
            return Err(EngineError::Validation(
                "reorder may not cross project boundaries".to_string(),
            ));
        }

        let _guard = self.acquire_project_lock(scope)?;

        let mut tx = self.catalog.begin()?;
        let children = tx.lock_children_for_update(scope.id, Some(parent_id))?;

        let new_sort = match compute_sort(&children, position, &self.sort) {
            SortOutcome::Key(key) => key,
            SortOutcome::NeedsRebalance => {
                rebalance(tx.as_mut(), scope.id, Some(parent_id), position, &self.sort)?
            }
        };

        let now = Utc::now();
        tx.update_node(
            node.id,
            NodePatch {
                sort: Some(new_sort),
                updated_at: Some(now),
                ..NodePatch::default()
            },
        )?;
        tx.commit()?;

        info!(
            project_id = %scope.id,
            node_id = %node.id,
            new_sort,
            "Reorder operation completed"
        );

        let mut reordered = node;
        reordered.sort = new_sort;
        reordered.updated_at = now;
        Ok(reordered)
    }

    fn acquire_project_lock<'a>(
        &'a self,
        scope: &ProjectScope,
    ) -> Result<ProjectLockGuard<'a>, EngineError> {
        let key = format!("move:project:{}", scope.id);
        let owner = uuid::Uuid::new_v4().to_string();
        if !self.locks.spin_lock(&key, &owner, self.lock.ttl()) {
            return Err(EngineError::Busy { key });
        }
        Ok(ProjectLockGuard {
            locks: self.locks.as_ref(),
            key,
            owner,
        })
    }

    /// Reject a destination that is the moved node itself or sits anywhere in
    /// its subtree; such a move would detach the subtree into a cycle.
    fn reject_descendant_destination(
        &self,
        node_id: NodeId,
        dest_parent_id: NodeId,
    ) -> Result<(), EngineError> {
        let mut current = Some(dest_parent_id);
        let mut hops = 0;
        while let Some(id) = current {
            if id == node_id {
                return Err(EngineError::Validation(
                    "cannot move a directory into its own subtree".to_string(),
                ));
            }
            hops += 1;
            if hops > MAX_ANCESTRY_HOPS {
                return Err(EngineError::Validation(
                    "parent chain exceeds depth limit; tree may be corrupted".to_string(),
                ));
            }
            current = self
                .catalog
                .node(id)?
                .and_then(|ancestor| ancestor.parent_id);
        }
        Ok(())
    }
}
