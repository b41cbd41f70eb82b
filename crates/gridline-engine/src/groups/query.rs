//! Read-only view of the group model handed to renderers.

use super::model::{ColumnGroup, GroupModel, HierarchyNode};

/// Borrowed query adapter; renderers get this instead of the mutable model
/// so a render pass cannot change hierarchy state.
#[derive(Clone, Copy)]
pub struct GroupQuery<'a> {
    model: &'a GroupModel,
}

impl<'a> GroupQuery<'a> {
    pub(crate) fn new(model: &'a GroupModel) -> Self {
        Self { model }
    }

    pub fn group(&self, id: &str) -> Option<&'a ColumnGroup> {
        self.model.group(id)
    }

    pub fn roots(&self) -> Vec<&'a ColumnGroup> {
        self.model.roots()
    }

    pub fn all(&self) -> Vec<&'a ColumnGroup> {
        self.model.all()
    }

    pub fn is_expanded(&self, id: &str) -> Option<bool> {
        self.model.is_expanded(id)
    }

    pub fn children(&self, id: &str) -> Vec<&'a ColumnGroup> {
        self.model.children(id)
    }

    pub fn descendants(&self, id: &str) -> Vec<&'a ColumnGroup> {
        self.model.descendants(id)
    }

    pub fn ancestors(&self, id: &str) -> Vec<&'a ColumnGroup> {
        self.model.ancestors(id)
    }

    pub fn hierarchy_tree(&self) -> Vec<HierarchyNode> {
        self.model.hierarchy_tree()
    }
}
