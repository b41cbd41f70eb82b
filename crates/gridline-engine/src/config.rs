//! Engine-wide tunables.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sort::NullOrdering;

/// Configuration handed to the grid façade at construction.
///
/// Every limit has a working default; hosts typically override only the
/// overscan and default sizes to match their layout.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Sort keys beyond this are silently truncated from the tail.
    pub max_sort_columns: usize,
    /// Maximum group nesting depth; root depth is 0.
    pub max_group_depth: u32,
    /// Undo entries kept before oldest-first eviction.
    pub max_history: usize,
    /// Cell edits closer together than this coalesce into one undo step.
    pub grouping_window: Duration,
    pub overscan_rows: usize,
    pub overscan_cols: usize,
    pub default_row_height: f64,
    pub default_col_width: f64,
    pub null_ordering: NullOrdering,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_sort_columns: 3,
            max_group_depth: 8,
            max_history: 100,
            grouping_window: Duration::from_millis(1000),
            overscan_rows: 3,
            overscan_cols: 1,
            default_row_height: 30.0,
            default_col_width: 100.0,
            null_ordering: NullOrdering::NullsLast,
        }
    }
}
