//! Tree operations
//!
//! Directory materialization, descendant key rewriting, and the move
//! protocol. These operate on catalog rows through the transaction seam and
//! treat the object store as a best-effort collaborator.

pub mod mover;
pub mod resolver;
pub mod rewrite;

pub use mover::MoveCoordinator;
pub use resolver::DirectoryResolver;
pub use rewrite::rewrite_descendant_keys;
