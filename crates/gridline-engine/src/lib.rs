//! Gridline engine: the headless core of a virtualized data grid.
//!
//! The engine decides what rows and columns exist, where they sit in pixel
//! space, which cells are currently visible, how data is stored, sorted,
//! filtered, grouped, and mutated, and how changes are announced. Rendering,
//! theming, clipboard, and persistence are collaborator concerns that
//! consume the [`grid::GridEngine`] surface and the [`events::EventBus`].

pub mod axis;
pub mod clock;
pub mod commands;
pub mod config;
pub mod data;
pub mod events;
pub mod filter;
pub mod graph;
pub mod grid;
pub mod groups;
pub mod locale;
pub mod sort;
pub mod viewport;

pub use axis::AxisModel;
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{BatchEditCommand, CellEdit, Command, CommandStack, LoadRowsCommand, SetCellCommand};
pub use config::GridConfig;
pub use data::{CellStore, ColumnKind, ColumnSpec, ColumnarStore, SparseStore};
pub use events::{AxisKind, CancelToken, EventBus, EventKind, GridEvent, ListenerId};
pub use filter::{FilterCondition, FilterOp, FilterSet};
pub use graph::DependencyGraph;
pub use grid::{ColumnDef, GridEngine};
pub use groups::{
    ColumnGroup, DefaultGroupRenderer, GroupHeaderView, GroupManager, GroupModel, GroupPatch,
    GroupQuery, GroupRenderer, HierarchyNode, RendererChoice, RendererFactory, RendererOptions,
    RendererRegistry, ValidationReport,
};
pub use locale::Locale;
pub use sort::{
    BackendResponse, NullOrdering, SortBackend, SortColumn, SortDirection, SortModel,
    SortOptions, SortState, SortTicket, apply_permutation, compare_values, invert_permutation,
    sort_permutation,
};
pub use viewport::{ScrollAlignment, ScrollPosition, Viewport};

#[cfg(test)]
mod tests;
