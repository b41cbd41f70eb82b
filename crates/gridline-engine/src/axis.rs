//! Per-axis size bookkeeping: element sizes plus a cumulative prefix table.
//!
//! `prefix[i]` is the pixel offset of element `i`; `prefix[count]` is the
//! total extent. Mutations only record a dirty watermark; the suffix is
//! repaired on the next query, so a burst of `set_size` calls costs one
//! rebuild instead of one per call. After every repair the table satisfies
//! `prefix[i+1] = prefix[i] + size[i]`, `prefix[0] = 0`.

use std::cell::{Cell, RefCell};

use gridline_common::{GridError, GridErrorKind};

#[derive(Debug)]
pub struct AxisModel {
    sizes: Vec<f64>,
    default_size: f64,
    prefix: RefCell<Vec<f64>>,
    /// First prefix slot whose value can no longer be trusted.
    dirty_from: Cell<usize>,
}

impl AxisModel {
    /// An axis of `count` elements, all at `default_size`.
    pub fn new(count: usize, default_size: f64) -> Self {
        let axis = Self {
            sizes: vec![default_size; count],
            default_size,
            prefix: RefCell::new(vec![0.0]),
            dirty_from: Cell::new(0),
        };
        axis.repair();
        axis
    }

    /// An axis with explicit per-element sizes.
    pub fn with_sizes(sizes: Vec<f64>, default_size: f64) -> Result<Self, GridError> {
        if let Some(bad) = sizes.iter().position(|s| *s < 0.0 || !s.is_finite()) {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message(format!("size at index {bad} is negative or non-finite")));
        }
        let axis = Self {
            sizes,
            default_size,
            prefix: RefCell::new(vec![0.0]),
            dirty_from: Cell::new(0),
        };
        axis.repair();
        Ok(axis)
    }

    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn default_size(&self) -> f64 {
        self.default_size
    }

    pub fn total_extent(&self) -> f64 {
        self.repair();
        self.prefix.borrow()[self.sizes.len()]
    }

    /// Offset of element `index`; `index == count` yields the total extent.
    pub fn offset_of(&self, index: usize) -> Option<f64> {
        if index > self.sizes.len() {
            return None;
        }
        self.repair();
        Some(self.prefix.borrow()[index])
    }

    pub fn size_of(&self, index: usize) -> Option<f64> {
        self.sizes.get(index).copied()
    }

    /// The element whose span contains `position`:
    /// `prefix[i] <= position < prefix[i+1]`. Zero-size elements are never
    /// returned. `None` outside `[0, total_extent)`.
    pub fn index_at(&self, position: f64) -> Option<usize> {
        if position < 0.0 || self.sizes.is_empty() {
            return None;
        }
        self.repair();
        let prefix = self.prefix.borrow();
        let count = self.sizes.len();
        // partition_point: number of prefix slots <= position; the candidate
        // element starts at the last such slot.
        let i = prefix.partition_point(|p| *p <= position);
        if i == 0 {
            return None;
        }
        let candidate = i - 1;
        if candidate >= count {
            return None;
        }
        Some(candidate)
    }

    /// Resize one element. O(1) now; the prefix suffix repairs on next query.
    pub fn set_size(&mut self, index: usize, size: f64) -> Result<(), GridError> {
        if size < 0.0 || !size.is_finite() {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message(format!("size {size} is negative or non-finite")));
        }
        let Some(slot) = self.sizes.get_mut(index) else {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message(format!("index {index} out of range")));
        };
        *slot = size;
        self.mark_dirty(index);
        Ok(())
    }

    /// Batch resize starting at `from`; one watermark, one later rebuild.
    pub fn set_sizes(&mut self, from: usize, sizes: &[f64]) -> Result<(), GridError> {
        if from + sizes.len() > self.sizes.len() {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message("batch resize exceeds axis length"));
        }
        if let Some(bad) = sizes.iter().position(|s| *s < 0.0 || !s.is_finite()) {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message(format!("size at offset {bad} is negative or non-finite")));
        }
        self.sizes[from..from + sizes.len()].copy_from_slice(sizes);
        self.mark_dirty(from);
        Ok(())
    }

    /// Grow with `default_size` elements or truncate.
    pub fn set_count(&mut self, count: usize) {
        let old = self.sizes.len();
        self.sizes.resize(count, self.default_size);
        self.mark_dirty(old.min(count));
    }

    /// Indices `[i, j)` covering the pixel span `[start, end)`: element
    /// `i - 1` lies fully above `start` and element `j` is the first fully
    /// below `end`. Partially visible elements are included.
    pub fn range_covering(&self, start: f64, end: f64) -> (usize, usize) {
        let count = self.sizes.len();
        if count == 0 || end <= start || end <= 0.0 {
            return (0, 0);
        }
        self.repair();
        let prefix = self.prefix.borrow();
        let lo = match self.index_at_locked(&prefix, start.max(0.0)) {
            Some(i) => i,
            None if start.max(0.0) >= prefix[count] => return (count, count),
            None => 0,
        };
        // First element starting at or after `end`.
        let hi = prefix[..=count].partition_point(|p| *p < end);
        (lo, hi.min(count).max(lo))
    }

    fn index_at_locked(&self, prefix: &[f64], position: f64) -> Option<usize> {
        let count = self.sizes.len();
        let i = prefix.partition_point(|p| *p <= position);
        if i == 0 {
            return None;
        }
        let candidate = i - 1;
        if candidate >= count {
            return None;
        }
        Some(candidate)
    }

    fn mark_dirty(&mut self, from: usize) {
        self.dirty_from.set(self.dirty_from.get().min(from));
    }

    fn repair(&self) {
        let count = self.sizes.len();
        let from = self.dirty_from.get();
        let mut prefix = self.prefix.borrow_mut();
        if from > count && prefix.len() == count + 1 {
            return;
        }
        // Entries [0..=from] are still valid; resize preserves them.
        prefix.resize(count + 1, 0.0);
        let start = from.min(count);
        for i in start..count {
            prefix[i + 1] = prefix[i] + self.sizes[i];
        }
        self.dirty_from.set(count + 1);
    }
}
