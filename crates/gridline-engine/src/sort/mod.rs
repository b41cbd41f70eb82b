//! Multi-key stable sorting: model, comparator composition, and the
//! reactive state manager.
//!
//! The engine never reorders data. [`sort_permutation`] returns an index
//! permutation mapping visual position to logical row; the façade and
//! renderers translate through it on every read.

mod backend;
mod engine;
mod model;
mod state;

pub use backend::{BackendResponse, SortBackend, SortTicket};
pub use engine::{apply_permutation, compare_values, invert_permutation, sort_permutation};
pub use model::{
    NullOrdering, SortColumn, SortDirection, SortModel, SortOptions, ValueComparator,
};
pub use state::SortState;
