//! Node catalog
//!
//! The relational catalog is the source of truth for hierarchy and ordering.
//! Nodes are flat rows in a parent-pointer model: `parent_id` points at the
//! containing directory, `sort` orders siblings, `file_key` materializes the
//! full path. All mutation happens through a transaction that locks the
//! sibling sets it touches and applies its writes atomically on commit.

pub mod memory;
pub mod persistence;

use crate::error::CatalogError;
use crate::types::{NodeId, ProjectId, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryCatalog;

/// One row of the virtual file tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub project_id: ProjectId,
    /// Containing directory; `None` only for the project root.
    pub parent_id: Option<NodeId>,
    pub is_directory: bool,
    /// Order key among siblings of the same parent. Directories created by
    /// path resolution carry 0 until a rebalance assigns them a real key.
    pub sort: SortKey,
    /// Materialized full path, unique per project. Directory keys end with `/`.
    pub file_key: String,
    /// Leaf component of `file_key`.
    pub name: String,
    pub is_hidden: bool,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of a sibling row used by ordering and path resolution.
#[derive(Debug, Clone)]
pub struct SiblingRow {
    pub id: NodeId,
    pub name: String,
    pub sort: SortKey,
    pub is_directory: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Node> for SiblingRow {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            sort: node.sort,
            is_directory: node.is_directory,
            created_at: node.created_at,
        }
    }
}

/// Partial update applied to one node row. `parent_id` is double-optional:
/// the outer level means "change it", the inner is the new value.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub parent_id: Option<Option<NodeId>>,
    pub sort: Option<SortKey>,
    pub file_key: Option<String>,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NodePatch {
    pub fn apply(&self, node: &mut Node) {
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        if let Some(sort) = self.sort {
            node.sort = sort;
        }
        if let Some(ref file_key) = self.file_key {
            node.file_key = file_key.clone();
        }
        if let Some(ref name) = self.name {
            node.name = name.clone();
        }
        if let Some(size) = self.size {
            node.size = size;
        }
        if let Some(updated_at) = self.updated_at {
            node.updated_at = updated_at;
        }
    }
}

/// Read surface of the catalog plus transaction entry.
pub trait Catalog: Send + Sync {
    fn node(&self, id: NodeId) -> Result<Option<Node>, CatalogError>;

    fn node_by_key(&self, project: ProjectId, file_key: &str)
        -> Result<Option<Node>, CatalogError>;

    /// Direct children of `parent` ordered by (sort, created_at, id).
    /// `parent = None` addresses the root row itself.
    fn siblings(
        &self,
        project: ProjectId,
        parent: Option<NodeId>,
    ) -> Result<Vec<SiblingRow>, CatalogError>;

    /// Every node whose key lies strictly under `prefix` (normalized to a
    /// trailing separator by the caller).
    fn descendants_by_prefix(
        &self,
        project: ProjectId,
        prefix: &str,
    ) -> Result<Vec<Node>, CatalogError>;

    fn begin(&self) -> Result<Box<dyn CatalogTx + '_>, CatalogError>;
}

/// One open transaction. Writes are staged and become visible to other
/// readers only at commit; dropping without commit rolls everything back and
/// releases any held sibling-set locks.
pub trait CatalogTx {
    fn node(&self, id: NodeId) -> Result<Option<Node>, CatalogError>;

    fn node_by_key(&self, project: ProjectId, file_key: &str)
        -> Result<Option<Node>, CatalogError>;

    /// Lock the direct children of `parent` for the lifetime of this
    /// transaction and return them. Blocks while another transaction holds
    /// the same sibling set; re-locking a set this transaction already holds
    /// is a no-op re-read.
    fn lock_children_for_update(
        &mut self,
        project: ProjectId,
        parent: Option<NodeId>,
    ) -> Result<Vec<SiblingRow>, CatalogError>;

    fn batch_update_sort(&mut self, updates: &[(NodeId, SortKey)]) -> Result<(), CatalogError>;

    /// Batch rewrite of materialized keys, used by descendant cascades.
    fn batch_update_keys(&mut self, updates: &[(NodeId, String)]) -> Result<(), CatalogError>;

    fn update_node(&mut self, id: NodeId, patch: NodePatch) -> Result<(), CatalogError>;

    fn insert(&mut self, node: Node) -> Result<(), CatalogError>;

    fn delete(&mut self, id: NodeId) -> Result<(), CatalogError>;

    fn descendants_by_prefix(
        &self,
        project: ProjectId,
        prefix: &str,
    ) -> Result<Vec<Node>, CatalogError>;

    fn commit(self: Box<Self>) -> Result<(), CatalogError>;
}
