//! In-memory catalog
//!
//! Reference implementation of the catalog traits: rows in a guarded map,
//! staged-write transactions, and a per-sibling-set lock table standing in
//! for the relational store's "select ... for update" row locks. Suitable for
//! tests and single-process embedding; a deployment backs the same traits
//! with its relational store.

use super::{Catalog, CatalogTx, Node, NodePatch, SiblingRow};
use crate::error::CatalogError;
use crate::types::{NodeId, ProjectId, SortKey};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};

type SiblingSetKey = (ProjectId, Option<NodeId>);

/// Blocking lock table keyed by sibling set. Mirrors row-level "for update"
/// semantics: an acquirer waits until the prior holder commits or rolls back.
struct ChildLockTable {
    locked: Mutex<HashSet<SiblingSetKey>>,
    unlocked: Condvar,
}

impl ChildLockTable {
    fn new() -> Self {
        Self {
            locked: Mutex::new(HashSet::new()),
            unlocked: Condvar::new(),
        }
    }

    fn acquire(&self, key: SiblingSetKey) {
        let mut locked = self.locked.lock();
        while locked.contains(&key) {
            self.unlocked.wait(&mut locked);
        }
        locked.insert(key);
    }

    fn release(&self, key: &SiblingSetKey) {
        let mut locked = self.locked.lock();
        locked.remove(key);
        self.unlocked.notify_all();
    }
}

struct Shared {
    rows: Mutex<HashMap<NodeId, Node>>,
    child_locks: ChildLockTable,
}

/// In-memory catalog over flat node rows.
pub struct MemoryCatalog {
    shared: Shared,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            shared: Shared {
                rows: Mutex::new(HashMap::new()),
                child_locks: ChildLockTable::new(),
            },
        }
    }

    /// Build a catalog from existing rows, e.g. a reloaded snapshot.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let catalog = Self::new();
        {
            let mut rows = catalog.shared.rows.lock();
            for node in nodes {
                rows.insert(node.id, node);
            }
        }
        catalog
    }

    /// All rows, unordered. Used by snapshot persistence.
    pub fn snapshot(&self) -> Vec<Node> {
        self.shared.rows.lock().values().cloned().collect()
    }

    /// Highest node id currently in the catalog, for seeding id generation
    /// after a reload.
    pub fn max_id(&self) -> Option<NodeId> {
        self.shared.rows.lock().keys().max().copied()
    }

    pub fn len(&self) -> usize {
        self.shared.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.rows.lock().is_empty()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn order_siblings(rows: &mut Vec<SiblingRow>) {
    rows.sort_by(|a, b| {
        a.sort
            .cmp(&b.sort)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl Catalog for MemoryCatalog {
    fn node(&self, id: NodeId) -> Result<Option<Node>, CatalogError> {
        Ok(self.shared.rows.lock().get(&id).cloned())
    }

    fn node_by_key(
        &self,
        project: ProjectId,
        file_key: &str,
    ) -> Result<Option<Node>, CatalogError> {
        Ok(self
            .shared
            .rows
            .lock()
            .values()
            .find(|n| n.project_id == project && n.file_key == file_key)
            .cloned())
    }

    fn siblings(
        &self,
        project: ProjectId,
        parent: Option<NodeId>,
    ) -> Result<Vec<SiblingRow>, CatalogError> {
        let rows = self.shared.rows.lock();
        let mut siblings: Vec<SiblingRow> = rows
            .values()
            .filter(|n| n.project_id == project && n.parent_id == parent)
            .map(SiblingRow::from)
            .collect();
        order_siblings(&mut siblings);
        Ok(siblings)
    }

    fn descendants_by_prefix(
        &self,
        project: ProjectId,
        prefix: &str,
    ) -> Result<Vec<Node>, CatalogError> {
        let rows = self.shared.rows.lock();
        Ok(rows
            .values()
            .filter(|n| {
                n.project_id == project && n.file_key.starts_with(prefix) && n.file_key != prefix
            })
            .cloned()
            .collect())
    }

    fn begin(&self) -> Result<Box<dyn CatalogTx + '_>, CatalogError> {
        Ok(Box::new(MemoryTx {
            shared: &self.shared,
            staged: HashMap::new(),
            held: HashSet::new(),
        }))
    }
}

/// Staged-write transaction over the shared row map.
struct MemoryTx<'a> {
    shared: &'a Shared,
    /// Staged writes: `Some(node)` is an upsert, `None` a delete.
    staged: HashMap<NodeId, Option<Node>>,
    held: HashSet<SiblingSetKey>,
}

impl MemoryTx<'_> {
    fn read(&self, id: NodeId) -> Option<Node> {
        match self.staged.get(&id) {
            Some(staged) => staged.clone(),
            None => self.shared.rows.lock().get(&id).cloned(),
        }
    }

    /// Base rows with staged writes applied on top.
    fn merged(&self) -> Vec<Node> {
        let mut merged: HashMap<NodeId, Node> = self.shared.rows.lock().clone();
        for (id, staged) in &self.staged {
            match staged {
                Some(node) => {
                    merged.insert(*id, node.clone());
                }
                None => {
                    merged.remove(id);
                }
            }
        }
        merged.into_values().collect()
    }

    fn modify(&mut self, id: NodeId, patch: &NodePatch) -> Result<(), CatalogError> {
        let mut node = self.read(id).ok_or(CatalogError::NodeNotFound(id.0))?;
        patch.apply(&mut node);
        self.staged.insert(id, Some(node));
        Ok(())
    }
}

impl CatalogTx for MemoryTx<'_> {
    fn node(&self, id: NodeId) -> Result<Option<Node>, CatalogError> {
        Ok(self.read(id))
    }

    fn node_by_key(
        &self,
        project: ProjectId,
        file_key: &str,
    ) -> Result<Option<Node>, CatalogError> {
        Ok(self
            .merged()
            .into_iter()
            .find(|n| n.project_id == project && n.file_key == file_key))
    }

    fn lock_children_for_update(
        &mut self,
        project: ProjectId,
        parent: Option<NodeId>,
    ) -> Result<Vec<SiblingRow>, CatalogError> {
        let key = (project, parent);
        if !self.held.contains(&key) {
            self.shared.child_locks.acquire(key);
            self.held.insert(key);
        }
        let mut siblings: Vec<SiblingRow> = self
            .merged()
            .iter()
            .filter(|n| n.project_id == project && n.parent_id == parent)
            .map(SiblingRow::from)
            .collect();
        order_siblings(&mut siblings);
        Ok(siblings)
    }

    fn batch_update_sort(&mut self, updates: &[(NodeId, SortKey)]) -> Result<(), CatalogError> {
        for (id, sort) in updates {
            self.modify(
                *id,
                &NodePatch {
                    sort: Some(*sort),
                    ..NodePatch::default()
                },
            )?;
        }
        Ok(())
    }

    fn batch_update_keys(&mut self, updates: &[(NodeId, String)]) -> Result<(), CatalogError> {
        for (id, file_key) in updates {
            self.modify(
                *id,
                &NodePatch {
                    file_key: Some(file_key.clone()),
                    ..NodePatch::default()
                },
            )?;
        }
        Ok(())
    }

    fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<(), CatalogError> {
        self.modify(id, &patch)
    }

    fn insert(&mut self, node: Node) -> Result<(), CatalogError> {
        if self.read(node.id).is_some() {
            return Err(CatalogError::Conflict(format!(
                "node id {} already exists",
                node.id
            )));
        }
        if self
            .node_by_key(node.project_id, &node.file_key)?
            .is_some()
        {
            return Err(CatalogError::DuplicateKey(node.file_key));
        }
        self.staged.insert(node.id, Some(node));
        Ok(())
    }

    fn delete(&mut self, id: NodeId) -> Result<(), CatalogError> {
        self.staged.insert(id, None);
        Ok(())
    }

    fn descendants_by_prefix(
        &self,
        project: ProjectId,
        prefix: &str,
    ) -> Result<Vec<Node>, CatalogError> {
        Ok(self
            .merged()
            .into_iter()
            .filter(|n| {
                n.project_id == project && n.file_key.starts_with(prefix) && n.file_key != prefix
            })
            .collect())
    }

    fn commit(self: Box<Self>) -> Result<(), CatalogError> {
        {
            let mut rows = self.shared.rows.lock();
            for (id, staged) in &self.staged {
                match staged {
                    Some(node) => {
                        rows.insert(*id, node.clone());
                    }
                    None => {
                        rows.remove(id);
                    }
                }
            }
        }
        // Held sibling-set locks release in Drop.
        Ok(())
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        for key in self.held.drain() {
            self.shared.child_locks.release(&key);
        }
    }
}
