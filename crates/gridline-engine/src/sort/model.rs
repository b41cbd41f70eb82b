//! Sort keys and the ordered sort model.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use gridline_common::Value;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Per-key comparator override. Receives the two resolved (non-null) values;
/// null routing stays with the engine's null-ordering policy.
pub type ValueComparator = Rc<dyn Fn(&Value, &Value) -> Ordering>;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Where nulls land in the output order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullOrdering {
    /// Nulls sort after everything, regardless of direction.
    #[default]
    NullsLast,
    /// Nulls compare smaller than any value, so direction moves them.
    NullsSmallest,
}

/// Options shared by every key of one sort run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortOptions {
    pub null_ordering: NullOrdering,
    pub locale: Locale,
}

/// One sort key: field (top-level or dotted path), direction, priority
/// (lower = higher precedence), optional comparator override.
#[derive(Clone)]
pub struct SortColumn {
    pub field: String,
    pub direction: SortDirection,
    pub priority: u32,
    pub comparator: Option<ValueComparator>,
}

impl SortColumn {
    pub fn new<S: Into<String>>(field: S, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
            priority: 0,
            comparator: None,
        }
    }

    pub fn ascending<S: Into<String>>(field: S) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending<S: Into<String>>(field: S) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    pub fn with_comparator(mut self, comparator: ValueComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }
}

impl fmt::Debug for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortColumn")
            .field("field", &self.field)
            .field("direction", &self.direction)
            .field("priority", &self.priority)
            .field("comparator", &self.comparator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl PartialEq for SortColumn {
    fn eq(&self, other: &Self) -> bool {
        let comparators_match = match (&self.comparator, &other.comparator) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        self.field == other.field
            && self.direction == other.direction
            && self.priority == other.priority
            && comparators_match
    }
}

/// Ordered sequence of sort keys, highest precedence first. Field names are
/// unique within a model; the column list never exceeds `max_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct SortModel {
    columns: SmallVec<[SortColumn; 4]>,
    max_columns: usize,
}

impl Default for SortModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SortModel {
    pub const DEFAULT_MAX_COLUMNS: usize = 3;

    pub fn new() -> Self {
        Self::with_limit(Self::DEFAULT_MAX_COLUMNS)
    }

    pub fn with_limit(max_columns: usize) -> Self {
        Self {
            columns: SmallVec::new(),
            max_columns,
        }
    }

    pub fn columns(&self) -> &[SortColumn] {
        &self.columns
    }

    pub fn max_columns(&self) -> usize {
        self.max_columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Insert a key at the front (highest precedence). A key for the same
    /// field elsewhere in the model is removed first; keys pushed past the
    /// column limit fall off the tail.
    pub fn add_column(&mut self, column: SortColumn) {
        self.columns.retain(|c| c.field != column.field);
        self.columns.insert(0, column);
        self.columns.truncate(self.max_columns);
        self.renumber();
    }

    pub fn remove_column(&mut self, field: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.field != field);
        if self.columns.len() == before {
            return false;
        }
        self.renumber();
        true
    }

    /// Cycle a field through none → ascending → descending → none.
    /// Returns the direction now in effect, `None` once removed.
    pub fn toggle(&mut self, field: &str) -> Option<SortDirection> {
        match self.columns.iter().position(|c| c.field == field) {
            None => {
                self.add_column(SortColumn::ascending(field));
                Some(SortDirection::Ascending)
            }
            Some(pos) => match self.columns[pos].direction {
                SortDirection::Ascending => {
                    self.columns[pos].direction = SortDirection::Descending;
                    Some(SortDirection::Descending)
                }
                SortDirection::Descending => {
                    self.columns.remove(pos);
                    self.renumber();
                    None
                }
            },
        }
    }

    pub fn direction_of(&self, field: &str) -> Option<SortDirection> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.direction)
    }

    pub fn priority_of(&self, field: &str) -> Option<u32> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.priority)
    }

    /// Reset to empty, returning the previous model.
    pub fn clear(&mut self) -> SortModel {
        let previous = self.clone();
        self.columns.clear();
        previous
    }

    fn renumber(&mut self) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.priority = i as u32;
        }
    }
}
