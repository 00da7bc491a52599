//! Sort key allocation
//!
//! Pure midpoint computation over a sibling set. No side effects; the caller
//! decides what to do with a `NeedsRebalance` signal.

use crate::catalog::SiblingRow;
use crate::config::SortConfig;
use crate::types::{Position, SortKey};

/// Outcome of a sort key computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    /// A usable key.
    Key(SortKey),
    /// The gap at the requested position is too small to split; the sibling
    /// set must be rebalanced before this insertion can land.
    NeedsRebalance,
}

/// Compute the sort key for inserting a node at `position` among `siblings`.
///
/// The rows may arrive in storage order; they are sorted by (sort, created_at)
/// here. An `After` anchor that is not among the siblings degrades to `End`.
pub fn compute_sort(siblings: &[SiblingRow], position: Position, cfg: &SortConfig) -> SortOutcome {
    if siblings.is_empty() {
        return SortOutcome::Key(cfg.default_step);
    }

    let mut ordered: Vec<&SiblingRow> = siblings.iter().collect();
    ordered.sort_by(|a, b| {
        a.sort
            .cmp(&b.sort)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let anchor_index = match position {
        Position::Beginning => {
            let first_sort = ordered[0].sort;
            return if first_sort > cfg.min_gap {
                SortOutcome::Key(first_sort / 2)
            } else {
                SortOutcome::NeedsRebalance
            };
        }
        Position::After(anchor) => ordered.iter().position(|row| row.id == anchor),
        Position::End => None,
    };

    let Some(index) = anchor_index else {
        // End, or an anchor no longer among the siblings: append.
        let last_sort = ordered.last().map(|row| row.sort).unwrap_or(0);
        return SortOutcome::Key(last_sort + cfg.default_step);
    };

    let anchor_sort = ordered[index].sort;
    let next_sort = match ordered.get(index + 1) {
        Some(next) => next.sort,
        // Virtual next value when the anchor is the last element.
        None => anchor_sort + cfg.default_step * 2,
    };

    let gap = next_sort - anchor_sort;
    if gap > cfg.min_gap {
        SortOutcome::Key(anchor_sort + gap / 2)
    } else {
        SortOutcome::NeedsRebalance
    }
}
