//! Descendant key rewriting
//!
//! When a directory's materialized path changes (rename, move, or an
//! after-the-fact name reconciliation), every descendant's file key must
//! follow. The substitution is boundary-safe: both prefixes are normalized to
//! a trailing separator before matching, so a sibling whose name merely
//! starts with the directory name is never touched.

use crate::catalog::CatalogTx;
use crate::error::CatalogError;
use crate::pathkey;
use crate::types::ProjectId;
use tracing::debug;

/// Rewrite the keys of every node under `old_prefix` to sit under
/// `new_prefix`, persisting in one batch. Returns the number of rows
/// rewritten. The directory row itself is not part of the cascade; the caller
/// updates it alongside its other fields.
pub fn rewrite_descendant_keys(
    tx: &mut dyn CatalogTx,
    project: ProjectId,
    old_prefix: &str,
    new_prefix: &str,
) -> Result<usize, CatalogError> {
    let old = pathkey::normalize_dir_key(old_prefix);
    let new = pathkey::normalize_dir_key(new_prefix);

    let descendants = tx.descendants_by_prefix(project, &old)?;
    let mut updates = Vec::with_capacity(descendants.len());
    for node in &descendants {
        if let Some(new_key) = pathkey::rewrite_prefix(&node.file_key, &old, &new) {
            updates.push((node.id, new_key));
        }
    }
    tx.batch_update_keys(&updates)?;

    debug!(
        project_id = %project,
        old_prefix = %old,
        new_prefix = %new,
        affected = updates.len(),
        "Rewrote descendant file keys"
    );
    Ok(updates.len())
}
