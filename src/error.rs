//! Error types
//!
//! One error enum per layer: `StorageError` for the object store, `CatalogError`
//! for the relational catalog, and `EngineError` for the operations the crate
//! exposes. Lower layers convert upward via `From`.

use thiserror::Error;

/// Object-store failures.
///
/// Whether a storage failure is fatal is decided at the call site, not here:
/// creation paths propagate it, move/rename paths log it and continue because
/// the catalog is authoritative.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("folder creation failed for {key}: {reason}")]
    CreateFolderFailed { key: String, reason: String },

    #[error("object creation failed for {key}: {reason}")]
    CreateObjectFailed { key: String, reason: String },

    #[error("rename failed from {src} to {dst}: {reason}")]
    RenameFailed {
        src: String,
        dst: String,
        reason: String,
    },

    #[error("delete failed for {key}: {reason}")]
    DeleteFailed { key: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Catalog (relational store) failures. Any of these inside an open
/// transaction triggers rollback.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("node not found: {0}")]
    NodeNotFound(u64),

    #[error("duplicate file key: {0}")]
    DuplicateKey(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("catalog io error: {0}")]
    Io(String),

    #[error("transaction conflict: {0}")]
    Conflict(String),
}

impl From<sled::Error> for CatalogError {
    fn from(e: sled::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<bincode::Error> for CatalogError {
    fn from(e: bincode::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Illegal request: traversal outside the work root, non-directory target
    /// parent, cross-project move, move into own descendant, key collision on
    /// create/rename. Raised before any lock or transaction is taken.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced node or parent does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The project move lock could not be acquired within the timeout.
    /// The caller should retry later.
    #[error("operation busy: could not acquire lock {key}")]
    Busy { key: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
