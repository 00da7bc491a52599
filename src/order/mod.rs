//! Sibling ordering
//!
//! Fractional indexing over integer sort keys: new keys are computed by
//! midpoint interpolation between neighbours, and when repeated insertion
//! exhausts the gap between two keys, the whole sibling set is rebalanced to
//! uniform spacing.

pub mod allocator;
pub mod rebalance;

pub use allocator::{compute_sort, SortOutcome};
pub use rebalance::rebalance;
