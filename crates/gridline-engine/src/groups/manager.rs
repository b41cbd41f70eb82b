//! Event-emitting orchestration over the group model plus renderer lookup.

use std::rc::Rc;

use gridline_common::{GridError, GridErrorKind};

use crate::events::{EventBus, GridEvent};

use super::model::{ColumnGroup, GroupModel, GroupPatch};
use super::query::GroupQuery;
use super::registry::{GroupHeaderView, RendererFactory, RendererOptions, RendererRegistry};

/// How the manager picks a renderer for a group header:
/// explicit registry name, inline factory, or the registry default.
pub enum RendererChoice {
    Default,
    Named(String),
    Inline(RendererFactory),
}

pub struct GroupManager {
    model: GroupModel,
    bus: Rc<EventBus>,
    registry: RendererRegistry,
}

impl GroupManager {
    pub fn new(bus: Rc<EventBus>, max_depth: u32) -> Self {
        Self::with_registry(bus, max_depth, RendererRegistry::new())
    }

    /// Use a caller-owned registry, e.g. one shared across several grids.
    pub fn with_registry(bus: Rc<EventBus>, max_depth: u32, registry: RendererRegistry) -> Self {
        Self {
            model: GroupModel::new(max_depth),
            bus,
            registry,
        }
    }

    /// Read-only adapter for renderers and hosts.
    pub fn query(&self) -> GroupQuery<'_> {
        GroupQuery::new(&self.model)
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        &mut self.registry
    }

    pub fn model(&self) -> &GroupModel {
        &self.model
    }

    /* ── mutations (events fire after the model change succeeds) ───── */

    pub fn add_group(&mut self, group: ColumnGroup) -> Result<(), GridError> {
        let group_id = group.group_id.clone();
        self.model.add_group(group)?;
        self.bus.emit(&GridEvent::GroupAdded {
            group_id: group_id.clone(),
        });
        let mut affected = vec![group_id.clone()];
        affected.extend(
            self.model
                .ancestors(&group_id)
                .iter()
                .map(|g| g.group_id.clone()),
        );
        self.bus.emit(&GridEvent::HierarchyChanged {
            affected_group_ids: affected,
        });
        Ok(())
    }

    pub fn remove_group(&mut self, id: &str, cascade: bool) -> bool {
        let Some(group) = self.model.group(id) else {
            return false;
        };
        let mut affected = vec![id.to_string()];
        affected.extend(self.model.descendants(id).iter().map(|g| g.group_id.clone()));
        if let Some(parent) = &group.parent_group_id {
            affected.push(parent.clone());
        }

        if !self.model.remove_group(id, cascade) {
            return false;
        }
        self.bus.emit(&GridEvent::GroupRemoved {
            group_id: id.to_string(),
        });
        self.bus.emit(&GridEvent::HierarchyChanged {
            affected_group_ids: affected,
        });
        true
    }

    pub fn update_group(&mut self, id: &str, patch: GroupPatch) -> Result<(), GridError> {
        let old_parent = self
            .model
            .group(id)
            .ok_or_else(|| GridError::new(GridErrorKind::NotFound).with_group(id))?
            .parent_group_id
            .clone();
        let structural = matches!(&patch.parent_group_id, Some(new) if *new != old_parent);

        self.model.update_group(id, patch)?;
        self.bus.emit(&GridEvent::GroupUpdated {
            group_id: id.to_string(),
        });
        if structural {
            let mut affected = vec![id.to_string()];
            affected.extend(self.model.descendants(id).iter().map(|g| g.group_id.clone()));
            if let Some(old) = old_parent {
                affected.push(old);
            }
            if let Some(new) = self.model.group(id).and_then(|g| g.parent_group_id.clone()) {
                affected.push(new);
            }
            self.bus.emit(&GridEvent::HierarchyChanged {
                affected_group_ids: affected,
            });
        }
        Ok(())
    }

    pub fn expand_group(&mut self, id: &str) -> bool {
        self.apply_expansion(id, true)
    }

    pub fn collapse_group(&mut self, id: &str) -> bool {
        self.apply_expansion(id, false)
    }

    fn apply_expansion(&mut self, id: &str, expanded: bool) -> bool {
        match self.model.set_expanded(id, expanded) {
            None => false,
            Some(previous) => {
                if previous != expanded {
                    self.bus.emit(&GridEvent::GroupToggled {
                        group_id: id.to_string(),
                        expanded,
                    });
                }
                true
            }
        }
    }

    pub fn toggle_group(&mut self, id: &str) -> Option<bool> {
        let expanded = self.model.toggle(id)?;
        self.bus.emit(&GridEvent::GroupToggled {
            group_id: id.to_string(),
            expanded,
        });
        Some(expanded)
    }

    pub fn is_expanded(&self, id: &str) -> Option<bool> {
        self.model.is_expanded(id)
    }

    /* ── rendering ─────────────────────────────────────────────────── */

    /// Produce the header view for one group using the chosen renderer.
    pub fn render_group(
        &self,
        id: &str,
        choice: &RendererChoice,
        options: &RendererOptions,
    ) -> Result<GroupHeaderView, GridError> {
        let group = self
            .model
            .group(id)
            .ok_or_else(|| GridError::new(GridErrorKind::NotFound).with_group(id))?;
        let renderer = match choice {
            RendererChoice::Named(name) => self.registry.get(name, options).ok_or_else(|| {
                GridError::new(GridErrorKind::InvalidArgument)
                    .with_message(format!("unknown renderer '{name}'"))
            })?,
            RendererChoice::Inline(factory) => factory(options),
            RendererChoice::Default => self.registry.default_renderer(options),
        };
        Ok(renderer.render(group, &self.query()))
    }
}
