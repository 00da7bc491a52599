//! Treeline: Hierarchical Ordering and Move Engine
//!
//! Maintains a stable sibling order for nodes in a virtual file tree stored
//! as flat parent-pointer rows, materializes missing directory levels on
//! demand, and relocates subtrees safely under concurrent access. The
//! relational catalog is the source of truth; the object store is a
//! best-effort collaborator behind a trait seam.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod lock;
pub mod logging;
pub mod order;
pub mod pathkey;
pub mod storage;
pub mod tree;
pub mod types;

pub use catalog::{Catalog, CatalogTx, MemoryCatalog, Node, NodePatch, SiblingRow};
pub use config::{EngineConfig, LockConfig, SortConfig};
pub use engine::TreeEngine;
pub use error::{CatalogError, EngineError, StorageError};
pub use lock::{LocalLockService, LockService};
pub use order::{compute_sort, rebalance, SortOutcome};
pub use storage::{MemoryStorage, ObjectInfo, Storage};
pub use types::{IdGenerator, NodeId, Position, ProjectId, ProjectScope, SequentialIds, SortKey};
