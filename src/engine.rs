//! Engine facade
//!
//! `TreeEngine` wires the catalog, object storage, lock service and
//! configuration together and exposes the operations the surrounding
//! workspace invokes: create, move, reorder, rename, and the after-the-fact
//! directory name reconciliation. Authorization and request parsing live with
//! the caller; everything here assumes the operation is already permitted.

use crate::catalog::{Catalog, MemoryCatalog, Node, NodePatch};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::lock::{LocalLockService, LockService};
use crate::order::{compute_sort, rebalance, SortOutcome};
use crate::pathkey;
use crate::storage::{MemoryStorage, Storage};
use crate::tree::rewrite::rewrite_descendant_keys;
use crate::tree::{DirectoryResolver, MoveCoordinator};
use crate::types::{IdGenerator, NodeId, Position, ProjectScope, SequentialIds, SortKey};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub struct TreeEngine {
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
    config: EngineConfig,
    resolver: DirectoryResolver,
    mover: MoveCoordinator,
}

impl TreeEngine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        storage: Arc<dyn Storage>,
        locks: Arc<dyn LockService>,
        ids: Arc<dyn IdGenerator>,
        config: EngineConfig,
    ) -> Self {
        let resolver = DirectoryResolver::new(catalog.clone(), storage.clone(), ids.clone());
        let mover = MoveCoordinator::new(
            catalog.clone(),
            storage.clone(),
            locks,
            config.sort.clone(),
            config.lock.clone(),
        );
        Self {
            catalog,
            storage,
            ids,
            config,
            resolver,
            mover,
        }
    }

    /// Fully in-memory engine: memory catalog and storage, local lock
    /// service, sequential ids. The default for tests and embedding.
    pub fn in_memory(config: EngineConfig) -> Self {
        let locks = Arc::new(LocalLockService::new(&config.lock));
        Self::new(
            Arc::new(MemoryCatalog::new()),
            Arc::new(MemoryStorage::new()),
            locks,
            Arc::new(SequentialIds::new()),
            config,
        )
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn resolver(&self) -> &DirectoryResolver {
        &self.resolver
    }

    /// Create a file at a project-relative path, materializing missing
    /// directory levels. The physical object must exist before the catalog
    /// row is written, so the storage write here is fatal on failure.
    pub fn create_file(
        &self,
        scope: &ProjectScope,
        relative_path: &str,
        content: &[u8],
    ) -> Result<Node, EngineError> {
        let relative = relative_path.trim_start_matches('/');
        if relative.is_empty() || relative.ends_with('/') {
            return Err(EngineError::Validation(format!(
                "not a file path: {}",
                relative_path
            )));
        }
        let file_key = pathkey::join(&scope.work_root, relative);
        if !pathkey::is_within(&scope.work_root, &file_key) {
            return Err(EngineError::Validation(format!(
                "file key outside project work root: {}",
                file_key
            )));
        }
        if self.catalog.node_by_key(scope.id, &file_key)?.is_some() {
            return Err(EngineError::Validation(format!(
                "file already exists: {}",
                file_key
            )));
        }

        let parent_id = self.resolver.parent_for_key(scope, &file_key)?;
        self.storage
            .create_file(&scope.work_root, &file_key, content)?;

        self.insert_leaf(scope, parent_id, &file_key, false, content.len() as u64)
    }

    /// Ensure a project-relative directory path exists; returns the deepest
    /// directory's id.
    pub fn create_directory(
        &self,
        scope: &ProjectScope,
        relative_dir_path: &str,
    ) -> Result<NodeId, EngineError> {
        self.resolver.ensure_path(scope, relative_dir_path)
    }

    /// Record a file or directory that already exists in storage (e.g.
    /// written directly by an automated agent). Size is probed from storage;
    /// a failed probe is advisory and records zero.
    pub fn record_external_file(
        &self,
        scope: &ProjectScope,
        full_file_key: &str,
        is_directory: bool,
    ) -> Result<Node, EngineError> {
        if self.catalog.node_by_key(scope.id, full_file_key)?.is_some() {
            return Err(EngineError::Validation(format!(
                "file already exists: {}",
                full_file_key
            )));
        }
        let parent_id = self.resolver.parent_for_key(scope, full_file_key)?;

        let size = if is_directory {
            0
        } else {
            match self.storage.head_object(full_file_key) {
                Ok(info) => info.size,
                Err(err) => {
                    warn!(
                        file_key = %full_file_key,
                        error = %err,
                        "Failed to probe object info; recording zero size"
                    );
                    0
                }
            }
        };

        let key = if is_directory {
            pathkey::normalize_dir_key(full_file_key)
        } else {
            full_file_key.to_string()
        };
        self.insert_leaf(scope, parent_id, &key, is_directory, size)
    }

    /// Move a node under another directory. See [`MoveCoordinator`].
    pub fn move_node(
        &self,
        scope: &ProjectScope,
        node_id: NodeId,
        dest_parent_id: NodeId,
        position: Position,
    ) -> Result<Node, EngineError> {
        self.mover.move_node(scope, node_id, dest_parent_id, position)
    }

    /// Reposition a node among its current siblings.
    pub fn reorder(
        &self,
        scope: &ProjectScope,
        node_id: NodeId,
        position: Position,
    ) -> Result<Node, EngineError> {
        self.mover.reorder(scope, node_id, position)
    }

    /// Rename a node's leaf component. Directory renames cascade to every
    /// descendant key. The new name must not collide with an existing key.
    pub fn rename_node(
        &self,
        scope: &ProjectScope,
        node_id: NodeId,
        new_name: &str,
    ) -> Result<Node, EngineError> {
        let node = self
            .catalog
            .node(node_id)?
            .ok_or_else(|| EngineError::NotFound(format!("node {}", node_id)))?;
        if node.project_id != scope.id {
            return Err(EngineError::Validation(
                "rename may not cross project boundaries".to_string(),
            ));
        }
        if node.parent_id.is_none() {
            return Err(EngineError::Validation(
                "the project root cannot be renamed".to_string(),
            ));
        }
        if node.name == new_name {
            return Ok(node);
        }
        let (renamed, _) = self.rename_internal(scope, node, new_name)?;
        Ok(renamed)
    }

    /// Reconcile a provisionally named directory against the authoritative
    /// name reported later by an external agent. Idempotent: a directory
    /// already carrying the name is left untouched. Returns the number of
    /// descendant keys rewritten.
    pub fn reconcile_directory_name(
        &self,
        scope: &ProjectScope,
        dir_id: NodeId,
        authoritative_name: &str,
    ) -> Result<usize, EngineError> {
        let dir = self
            .catalog
            .node(dir_id)?
            .ok_or_else(|| EngineError::NotFound(format!("node {}", dir_id)))?;
        if !dir.is_directory {
            return Err(EngineError::Validation(format!(
                "node {} is not a directory",
                dir_id
            )));
        }
        if dir.name == authoritative_name {
            return Ok(0);
        }
        let (_, rewritten) = self.rename_internal(scope, dir, authoritative_name)?;
        info!(
            project_id = %scope.id,
            dir_id = %dir_id,
            name = %authoritative_name,
            descendants_rewritten = rewritten,
            "Reconciled directory name"
        );
        Ok(rewritten)
    }

    /// Sort key for a node about to be inserted under `parent`. Locks the
    /// sibling set and rebalances when the gap is exhausted, so the returned
    /// key is valid until the caller's insert lands under the same parent.
    pub fn compute_sort_for_new_node(
        &self,
        scope: &ProjectScope,
        parent_id: NodeId,
        position: Position,
    ) -> Result<SortKey, EngineError> {
        let mut tx = self.catalog.begin()?;
        let children = tx.lock_children_for_update(scope.id, Some(parent_id))?;
        let key = match compute_sort(&children, position, &self.config.sort) {
            SortOutcome::Key(key) => key,
            SortOutcome::NeedsRebalance => rebalance(
                tx.as_mut(),
                scope.id,
                Some(parent_id),
                position,
                &self.config.sort,
            )?,
        };
        tx.commit()?;
        Ok(key)
    }

    /// Children of `parent` in display order (sort ascending, creation time
    /// as tiebreak).
    pub fn siblings(
        &self,
        scope: &ProjectScope,
        parent_id: NodeId,
    ) -> Result<Vec<Node>, EngineError> {
        let rows = self.catalog.siblings(scope.id, Some(parent_id))?;
        let mut nodes = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(node) = self.catalog.node(row.id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn insert_leaf(
        &self,
        scope: &ProjectScope,
        parent_id: NodeId,
        file_key: &str,
        is_directory: bool,
        size: u64,
    ) -> Result<Node, EngineError> {
        let mut tx = self.catalog.begin()?;
        let children = tx.lock_children_for_update(scope.id, Some(parent_id))?;
        let sort = match compute_sort(&children, Position::End, &self.config.sort) {
            SortOutcome::Key(key) => key,
            SortOutcome::NeedsRebalance => rebalance(
                tx.as_mut(),
                scope.id,
                Some(parent_id),
                Position::End,
                &self.config.sort,
            )?,
        };

        let now = Utc::now();
        let node = Node {
            id: self.ids.next_id(),
            project_id: scope.id,
            parent_id: Some(parent_id),
            is_directory,
            sort,
            file_key: file_key.to_string(),
            name: pathkey::basename(file_key).to_string(),
            is_hidden: false,
            size,
            created_at: now,
            updated_at: now,
        };
        tx.insert(node.clone())?;
        tx.commit()?;

        info!(
            project_id = %scope.id,
            node_id = %node.id,
            file_key = %node.file_key,
            sort,
            "Created catalog node"
        );
        Ok(node)
    }

    /// Shared rename path for files and directories. Physical renames are
    /// advisory; the catalog update is what counts.
    fn rename_internal(
        &self,
        scope: &ProjectScope,
        node: Node,
        new_name: &str,
    ) -> Result<(Node, usize), EngineError> {
        if new_name.is_empty() || new_name.contains('/') {
            return Err(EngineError::Validation(format!(
                "illegal name: {:?}",
                new_name
            )));
        }

        let parent_dir = pathkey::dir_of(&node.file_key);
        let new_key = if node.is_directory {
            pathkey::normalize_dir_key(&pathkey::join(parent_dir, new_name))
        } else {
            pathkey::join(parent_dir, new_name)
        };
        if !pathkey::is_within(&scope.work_root, &new_key) {
            return Err(EngineError::Validation(format!(
                "destination key outside project work root: {}",
                new_key
            )));
        }
        if self.catalog.node_by_key(scope.id, &new_key)?.is_some() {
            return Err(EngineError::Validation(format!(
                "file already exists: {}",
                new_key
            )));
        }

        let mut tx = self.catalog.begin()?;

        let rewritten = if node.is_directory {
            // Physical renames for the subtree are advisory, one per object.
            let descendants = tx.descendants_by_prefix(scope.id, &node.file_key)?;
            for descendant in &descendants {
                if let Some(new_descendant_key) =
                    pathkey::rewrite_prefix(&descendant.file_key, &node.file_key, &new_key)
                {
                    if let Err(err) = self.storage.rename_object(
                        &scope.work_root,
                        &descendant.file_key,
                        &new_descendant_key,
                    ) {
                        warn!(
                            src_key = %descendant.file_key,
                            error = %err,
                            "Physical rename failed during directory rename"
                        );
                    }
                }
            }
            rewrite_descendant_keys(tx.as_mut(), scope.id, &node.file_key, &new_key)?
        } else {
            0
        };

        if let Err(err) = self
            .storage
            .rename_object(&scope.work_root, &node.file_key, &new_key)
        {
            warn!(
                src_key = %node.file_key,
                dst_key = %new_key,
                error = %err,
                "Physical rename failed; catalog update proceeds"
            );
        }

        let now = Utc::now();
        tx.update_node(
            node.id,
            NodePatch {
                file_key: Some(new_key.clone()),
                name: Some(new_name.to_string()),
                updated_at: Some(now),
                ..NodePatch::default()
            },
        )?;
        tx.commit()?;

        info!(
            project_id = %scope.id,
            node_id = %node.id,
            new_key = %new_key,
            descendants_rewritten = rewritten,
            "Rename completed"
        );

        let mut renamed = node;
        renamed.file_key = new_key;
        renamed.name = new_name.to_string();
        renamed.updated_at = now;
        Ok((renamed, rewritten))
    }
}
