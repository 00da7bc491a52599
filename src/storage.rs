//! Object storage seam
//!
//! The cloud object store holding the physical bytes behind the catalog. The
//! catalog is the source of truth for hierarchy and ordering; this backend is
//! a secondary system-of-record that may transiently diverge on partial
//! failure. Calls are keyed by a project-relative prefix plus the full object
//! key.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Result of a `head_object` probe.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

pub trait Storage: Send + Sync {
    fn create_folder(&self, prefix: &str, key: &str) -> Result<(), StorageError>;
    fn create_file(&self, prefix: &str, key: &str, content: &[u8]) -> Result<(), StorageError>;
    fn rename_object(&self, prefix: &str, src_key: &str, dst_key: &str) -> Result<(), StorageError>;
    fn delete_objects(&self, prefix: &str, keys: &[String]) -> Result<(), StorageError>;
    fn head_object(&self, key: &str) -> Result<ObjectInfo, StorageError>;
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    is_folder: bool,
    last_modified: DateTime<Utc>,
}

/// In-memory object store for tests and embedded use.
///
/// Rename moves a single key, like the real backend: renaming a folder does
/// not implicitly move the objects under it, the caller drives those.
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Whether an object or folder marker exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    /// Number of stored objects, folder markers included.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn create_folder(&self, _prefix: &str, key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.lock();
        // Folder creation is idempotent on object stores.
        objects.entry(key.to_string()).or_insert(StoredObject {
            data: Vec::new(),
            is_folder: true,
            last_modified: Utc::now(),
        });
        Ok(())
    }

    fn create_file(&self, _prefix: &str, key: &str, content: &[u8]) -> Result<(), StorageError> {
        let mut objects = self.objects.lock();
        objects.insert(
            key.to_string(),
            StoredObject {
                data: content.to_vec(),
                is_folder: false,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    fn rename_object(&self, _prefix: &str, src_key: &str, dst_key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.lock();
        let mut object = objects
            .remove(src_key)
            .ok_or_else(|| StorageError::NotFound(src_key.to_string()))?;
        object.last_modified = Utc::now();
        objects.insert(dst_key.to_string(), object);
        Ok(())
    }

    fn delete_objects(&self, _prefix: &str, keys: &[String]) -> Result<(), StorageError> {
        let mut objects = self.objects.lock();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn head_object(&self, key: &str) -> Result<ObjectInfo, StorageError> {
        let objects = self.objects.lock();
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(ObjectInfo {
            size: object.data.len() as u64,
            last_modified: object.last_modified,
        })
    }
}
