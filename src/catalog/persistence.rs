//! Catalog snapshot persistence
//!
//! Sled-backed durability for catalog rows: each node is one bincode-encoded
//! record keyed by its id. The in-memory catalog loads from and saves to a
//! snapshot store; the embedding application decides when to flush.

use super::{MemoryCatalog, Node};
use crate::error::CatalogError;
use crate::types::NodeId;
use std::path::Path;

/// Sled tree holding one record per node.
pub struct SnapshotStore {
    db: sled::Db,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Persist the full row set, replacing any previous snapshot.
    pub fn save(&self, nodes: &[Node]) -> Result<(), CatalogError> {
        self.db.clear()?;
        for node in nodes {
            let key = node.id.0.to_be_bytes();
            let value = bincode::serialize(node)?;
            self.db.insert(key, value)?;
        }
        self.db.flush()?;
        Ok(())
    }

    /// Load every persisted row.
    pub fn load(&self) -> Result<Vec<Node>, CatalogError> {
        let mut nodes = Vec::new();
        for entry in self.db.iter() {
            let (_, value) = entry?;
            nodes.push(bincode::deserialize::<Node>(&value)?);
        }
        Ok(nodes)
    }

    /// Load a catalog straight from the snapshot.
    pub fn load_catalog(&self) -> Result<MemoryCatalog, CatalogError> {
        Ok(MemoryCatalog::from_nodes(self.load()?))
    }

    /// Remove a single persisted row, e.g. after an out-of-band delete.
    pub fn remove(&self, id: NodeId) -> Result<(), CatalogError> {
        self.db.remove(id.0.to_be_bytes())?;
        Ok(())
    }
}
