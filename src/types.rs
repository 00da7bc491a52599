//! Shared identifier and position types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Catalog-unique node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partitioning boundary for the tree; no parent/child or ordering
/// relationship crosses a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer order key; meaningful only among siblings of one parent.
pub type SortKey = i64;

/// Insert position among the siblings of a target parent.
///
/// Replaces the legacy sentinel scheme where `null`, `0` and `-1` all meant
/// "insert first". `After` with an id that is not among the siblings degrades
/// to `End` semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Insert before every current sibling.
    Beginning,
    /// Insert directly after the given sibling.
    After(NodeId),
    /// Insert after every current sibling.
    End,
}

/// Project scope handed to every engine operation: the project id plus the
/// work root key all of its file keys live under (always with a trailing
/// separator).
#[derive(Debug, Clone)]
pub struct ProjectScope {
    pub id: ProjectId,
    pub work_root: String,
}

impl ProjectScope {
    pub fn new(id: ProjectId, work_root: impl Into<String>) -> Self {
        let mut work_root = work_root.into();
        if !work_root.ends_with('/') {
            work_root.push('/');
        }
        Self { id, work_root }
    }
}

/// Seam for node id allocation. The surrounding system issues snowflake-style
/// ids; tests and embedded use get a monotonic counter.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> NodeId;
}

/// Monotonic in-process id source.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Start issuing from a given id, e.g. after reloading a snapshot.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
