//! Hierarchical column groups: model, event-emitting manager, renderer
//! registry, and the read-only query adapter renderers consume.

mod manager;
mod model;
mod query;
mod registry;

pub use manager::{GroupManager, RendererChoice};
pub use model::{ColumnGroup, GroupModel, GroupPatch, HierarchyNode, ValidationReport};
pub use query::GroupQuery;
pub use registry::{
    DEFAULT_RENDERER, DefaultGroupRenderer, GroupHeaderView, GroupRenderer, RendererFactory,
    RendererOptions, RendererRegistry,
};
