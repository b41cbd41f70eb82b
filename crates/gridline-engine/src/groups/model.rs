//! Hierarchical column groups.
//!
//! Groups form a forest: each group stores its parent id and an ordered child
//! list, and the same structure is mirrored into a [`DependencyGraph`] with a
//! child → parent edge per group. Every structural mutation is trial-run on a
//! clone of that graph first; a rejected mutation leaves the group map and
//! the committed graph untouched. `level` is always derived (root = 0).

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use gridline_common::{GridError, GridErrorKind};

use crate::graph::DependencyGraph;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    pub group_id: String,
    pub header_name: String,
    pub parent_group_id: Option<String>,
    /// Managed by the model; ordered.
    pub child_ids: SmallVec<[String; 4]>,
    pub column_fields: Vec<String>,
    pub expanded: bool,
    /// Derived: number of parent edges up to the root.
    pub level: u32,
}

impl ColumnGroup {
    pub fn new<I: Into<String>, H: Into<String>>(group_id: I, header_name: H) -> Self {
        Self {
            group_id: group_id.into(),
            header_name: header_name.into(),
            parent_group_id: None,
            child_ids: SmallVec::new(),
            column_fields: Vec::new(),
            expanded: true,
            level: 0,
        }
    }

    pub fn with_parent<S: Into<String>>(mut self, parent: S) -> Self {
        self.parent_group_id = Some(parent.into());
        self
    }

    pub fn with_fields<S: Into<String>, I: IntoIterator<Item = S>>(mut self, fields: I) -> Self {
        self.column_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.expanded = false;
        self
    }
}

/// Partial update for [`GroupModel::update_group`]. `parent_group_id` is
/// doubly optional: `None` = leave alone, `Some(None)` = detach to root.
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub header_name: Option<String>,
    pub parent_group_id: Option<Option<String>>,
    pub column_fields: Option<Vec<String>>,
    pub expanded: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// One node of the materialized hierarchy tree.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub group: ColumnGroup,
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone)]
pub struct GroupModel {
    groups: FxHashMap<String, ColumnGroup>,
    graph: DependencyGraph,
    max_depth: u32,
}

impl GroupModel {
    pub fn new(max_depth: u32) -> Self {
        Self {
            groups: FxHashMap::default(),
            graph: DependencyGraph::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    pub fn group(&self, id: &str) -> Option<&ColumnGroup> {
        self.groups.get(id)
    }

    /// The backing graph; exposed so hierarchy invariants can be asserted.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /* ── mutations ─────────────────────────────────────────────────── */

    pub fn add_group(&mut self, mut group: ColumnGroup) -> Result<(), GridError> {
        if group.group_id.is_empty() {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message("group id must not be empty"));
        }
        if group.header_name.is_empty() {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_group(group.group_id.clone())
                .with_message("header name must not be empty"));
        }
        if self.groups.contains_key(&group.group_id) {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_group(group.group_id.clone())
                .with_message("duplicate group id"));
        }
        if group.parent_group_id.as_deref() == Some(group.group_id.as_str()) {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_group(group.group_id.clone())
                .with_message("a group cannot be its own parent"));
        }

        let level = match &group.parent_group_id {
            Some(parent) => match self.groups.get(parent) {
                Some(parent_group) => {
                    if parent_group.level + 1 >= self.max_depth {
                        return Err(GridError::new(GridErrorKind::MaxDepthExceeded)
                            .with_group(group.group_id.clone())
                            .with_message(format!(
                                "group would sit at depth {} (limit {})",
                                parent_group.level + 1,
                                self.max_depth
                            )));
                    }
                    parent_group.level + 1
                }
                None => {
                    return Err(GridError::new(GridErrorKind::NotFound)
                        .with_group(parent.clone())
                        .with_message("parent group does not exist"));
                }
            },
            None => 0,
        };

        // Trial-run on a scratch graph; commit only if acyclic.
        let mut scratch = self.graph.clone();
        scratch.add_node(group.group_id.clone());
        if let Some(parent) = &group.parent_group_id {
            scratch.add_edge(group.group_id.clone(), parent.clone());
        }
        if scratch.has_cycle() {
            return Err(GridError::new(GridErrorKind::CycleDetected)
                .with_group(group.group_id.clone())
                .with_message("inserting the group would create a cycle"));
        }

        self.graph = scratch;
        if let Some(parent) = group.parent_group_id.clone() {
            if let Some(parent_group) = self.groups.get_mut(&parent) {
                parent_group.child_ids.push(group.group_id.clone());
            }
        }
        group.child_ids.clear();
        group.level = level;
        self.groups.insert(group.group_id.clone(), group);
        Ok(())
    }

    /// Remove a group. `cascade` removes the whole subtree; otherwise the
    /// children are re-parented to the removed group's parent (or become
    /// roots) and their levels are recomputed. Returns false for unknown ids.
    pub fn remove_group(&mut self, id: &str, cascade: bool) -> bool {
        if !self.groups.contains_key(id) {
            return false;
        }
        if cascade {
            let mut doomed: Vec<String> = vec![id.to_string()];
            doomed.extend(self.descendant_ids(id));
            let parent = self.groups[id].parent_group_id.clone();
            for dead in &doomed {
                self.groups.remove(dead);
                self.graph.remove_node(dead);
            }
            if let Some(parent) = parent {
                if let Some(parent_group) = self.groups.get_mut(&parent) {
                    parent_group.child_ids.retain(|c| c.as_str() != id);
                }
            }
            return true;
        }

        let Some(removed) = self.groups.remove(id) else {
            return false;
        };
        self.graph.remove_node(id);

        for child_id in &removed.child_ids {
            if let Some(child) = self.groups.get_mut(child_id) {
                child.parent_group_id = removed.parent_group_id.clone();
            }
            if let Some(parent) = &removed.parent_group_id {
                self.graph.add_edge(child_id.clone(), parent.clone());
            }
        }

        if let Some(parent) = &removed.parent_group_id {
            if let Some(parent_group) = self.groups.get_mut(parent) {
                // Children take the removed group's slot, preserving order.
                if let Some(pos) = parent_group.child_ids.iter().position(|c| c == id) {
                    parent_group.child_ids.remove(pos);
                    parent_group
                        .child_ids
                        .insert_many(pos, removed.child_ids.iter().cloned());
                } else {
                    parent_group.child_ids.extend(removed.child_ids.iter().cloned());
                }
            }
        }

        for child_id in &removed.child_ids {
            self.recompute_levels(child_id);
        }
        true
    }

    pub fn update_group(&mut self, id: &str, patch: GroupPatch) -> Result<(), GridError> {
        if !self.groups.contains_key(id) {
            return Err(GridError::new(GridErrorKind::NotFound)
                .with_group(id)
                .with_message("no such group"));
        }
        if matches!(&patch.header_name, Some(name) if name.is_empty()) {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_group(id)
                .with_message("header name must not be empty"));
        }

        let old_parent = self.groups[id].parent_group_id.clone();
        let parent_change = match &patch.parent_group_id {
            Some(new_parent) if *new_parent != old_parent => Some(new_parent.clone()),
            _ => None,
        };

        if let Some(new_parent) = &parent_change {
            self.check_reparent(id, old_parent.as_deref(), new_parent.as_deref())?;
        }

        // All checks passed; commit.
        if let Some(new_parent) = parent_change {
            if let Some(old) = &old_parent {
                self.graph.remove_edge(id, old);
                if let Some(old_group) = self.groups.get_mut(old) {
                    old_group.child_ids.retain(|c| c.as_str() != id);
                }
            }
            if let Some(new) = &new_parent {
                self.graph.add_edge(id.to_string(), new.clone());
                if let Some(new_group) = self.groups.get_mut(new) {
                    new_group.child_ids.push(id.to_string());
                }
            }
            if let Some(group) = self.groups.get_mut(id) {
                group.parent_group_id = new_parent;
            }
            self.recompute_levels(id);
        }

        let Some(group) = self.groups.get_mut(id) else {
            return Ok(());
        };
        if let Some(header) = patch.header_name {
            group.header_name = header;
        }
        if let Some(fields) = patch.column_fields {
            group.column_fields = fields;
        }
        if let Some(expanded) = patch.expanded {
            group.expanded = expanded;
        }
        Ok(())
    }

    fn check_reparent(
        &self,
        id: &str,
        old_parent: Option<&str>,
        new_parent: Option<&str>,
    ) -> Result<(), GridError> {
        if new_parent == Some(id) {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_group(id)
                .with_message("a group cannot be its own parent"));
        }
        if let Some(new_parent) = new_parent {
            if !self.groups.contains_key(new_parent) {
                return Err(GridError::new(GridErrorKind::NotFound)
                    .with_group(new_parent)
                    .with_message("new parent does not exist"));
            }
        }

        let mut scratch = self.graph.clone();
        if let Some(old) = old_parent {
            scratch.remove_edge(id, old);
        }
        if let Some(new) = new_parent {
            scratch.add_edge(id.to_string(), new.to_string());
        }
        if scratch.has_cycle() {
            return Err(GridError::new(GridErrorKind::CycleDetected)
                .with_group(id)
                .with_message("re-parenting would create a cycle"));
        }

        let new_level = match new_parent {
            Some(p) => self.groups[p].level + 1,
            None => 0,
        };
        if new_level + self.subtree_height(id) >= self.max_depth {
            return Err(GridError::new(GridErrorKind::MaxDepthExceeded)
                .with_group(id)
                .with_message(format!(
                    "re-parenting would nest deeper than {}",
                    self.max_depth
                )));
        }
        Ok(())
    }

    /* ── expand / collapse ─────────────────────────────────────────── */

    /// Set the expansion state; returns the previous state, `None` when the
    /// group is unknown.
    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> Option<bool> {
        let group = self.groups.get_mut(id)?;
        let previous = group.expanded;
        group.expanded = expanded;
        Some(previous)
    }

    pub fn expand(&mut self, id: &str) -> bool {
        self.set_expanded(id, true).is_some()
    }

    pub fn collapse(&mut self, id: &str) -> bool {
        self.set_expanded(id, false).is_some()
    }

    /// Flip the state; returns the new state, `None` when unknown.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let group = self.groups.get_mut(id)?;
        group.expanded = !group.expanded;
        Some(group.expanded)
    }

    pub fn is_expanded(&self, id: &str) -> Option<bool> {
        self.groups.get(id).map(|g| g.expanded)
    }

    /* ── queries ───────────────────────────────────────────────────── */

    pub fn children(&self, id: &str) -> Vec<&ColumnGroup> {
        match self.groups.get(id) {
            Some(group) => group
                .child_ids
                .iter()
                .filter_map(|c| self.groups.get(c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Preorder walk of the subtree below `id` (excluding `id` itself).
    pub fn descendants(&self, id: &str) -> Vec<&ColumnGroup> {
        let ids = self.descendant_ids(id);
        ids.iter()
            .filter_map(|d| self.groups.get(d.as_str()))
            .collect()
    }

    fn descendant_ids(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<String> = match self.groups.get(id) {
            Some(group) => group.child_ids.iter().rev().cloned().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            if let Some(group) = self.groups.get(&current) {
                stack.extend(group.child_ids.iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Parent chain, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<&ColumnGroup> {
        let mut out = Vec::new();
        let mut current = self.groups.get(id).and_then(|g| g.parent_group_id.as_deref());
        while let Some(parent_id) = current {
            match self.groups.get(parent_id) {
                Some(parent) => {
                    out.push(parent);
                    current = parent.parent_group_id.as_deref();
                }
                None => break,
            }
        }
        out
    }

    /// Root groups, ordered by id for deterministic output.
    pub fn roots(&self) -> Vec<&ColumnGroup> {
        let mut roots: Vec<&ColumnGroup> = self
            .groups
            .values()
            .filter(|g| g.parent_group_id.is_none())
            .collect();
        roots.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        roots
    }

    /// Every group, ordered by id.
    pub fn all(&self) -> Vec<&ColumnGroup> {
        let mut all: Vec<&ColumnGroup> = self.groups.values().collect();
        all.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        all
    }

    pub fn hierarchy_tree(&self) -> Vec<HierarchyNode> {
        self.roots()
            .into_iter()
            .map(|root| self.subtree(root))
            .collect()
    }

    fn subtree(&self, group: &ColumnGroup) -> HierarchyNode {
        HierarchyNode {
            group: group.clone(),
            children: group
                .child_ids
                .iter()
                .filter_map(|c| self.groups.get(c))
                .map(|child| self.subtree(child))
                .collect(),
        }
    }

    /// Longest chain of edges below `id`; 0 for a leaf.
    fn subtree_height(&self, id: &str) -> u32 {
        match self.groups.get(id) {
            Some(group) => group
                .child_ids
                .iter()
                .map(|c| 1 + self.subtree_height(c))
                .max()
                .unwrap_or(0),
            None => 0,
        }
    }

    fn recompute_levels(&mut self, root: &str) {
        let mut queue: Vec<String> = vec![root.to_string()];
        while let Some(id) = queue.pop() {
            let level = match self.groups.get(&id).and_then(|g| g.parent_group_id.clone()) {
                Some(parent) => match self.groups.get(&parent) {
                    Some(parent_group) => parent_group.level + 1,
                    None => 0,
                },
                None => 0,
            };
            if let Some(group) = self.groups.get_mut(&id) {
                group.level = level;
                queue.extend(group.child_ids.iter().cloned());
            }
        }
    }

    /* ── validation ────────────────────────────────────────────────── */

    /// Pre-insert validation of a candidate group against the current model.
    pub fn validate_group(&self, group: &ColumnGroup) -> ValidationReport {
        let mut report = ValidationReport::default();
        if group.group_id.is_empty() {
            report.errors.push("group id must not be empty".into());
        }
        if group.header_name.is_empty() {
            report.errors.push("header name must not be empty".into());
        }
        if self.groups.contains_key(&group.group_id) {
            report
                .errors
                .push(format!("duplicate group id '{}'", group.group_id));
        }
        match &group.parent_group_id {
            Some(parent) if parent == &group.group_id => {
                report.errors.push("a group cannot be its own parent".into());
            }
            Some(parent) => match self.groups.get(parent) {
                Some(parent_group) => {
                    if parent_group.level + 1 >= self.max_depth {
                        report.errors.push(format!(
                            "group would sit at depth {} (limit {})",
                            parent_group.level + 1,
                            self.max_depth
                        ));
                    }
                }
                None => {
                    report
                        .errors
                        .push(format!("parent group '{parent}' does not exist"));
                }
            },
            None => {}
        }
        if group.column_fields.is_empty() {
            report
                .warnings
                .push(format!("group '{}' spans no columns", group.group_id));
        }
        report.finish()
    }

    /// Whole-forest consistency check: cycles, orphaned parent references,
    /// parent/child list mismatches, stale levels.
    pub fn validate_hierarchy(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.graph.has_cycle() {
            report.errors.push("group graph contains a cycle".into());
        }
        for group in self.groups.values() {
            if let Some(parent_id) = &group.parent_group_id {
                match self.groups.get(parent_id) {
                    Some(parent) => {
                        if !parent.child_ids.contains(&group.group_id) {
                            report.errors.push(format!(
                                "group '{}' is missing from parent '{parent_id}' child list",
                                group.group_id
                            ));
                        }
                    }
                    None => {
                        report.errors.push(format!(
                            "group '{}' references missing parent '{parent_id}'",
                            group.group_id
                        ));
                    }
                }
            }
            for child_id in &group.child_ids {
                match self.groups.get(child_id) {
                    Some(child) => {
                        if child.parent_group_id.as_deref() != Some(group.group_id.as_str()) {
                            report.errors.push(format!(
                                "child '{child_id}' of '{}' points at a different parent",
                                group.group_id
                            ));
                        }
                    }
                    None => {
                        report.errors.push(format!(
                            "group '{}' lists missing child '{child_id}'",
                            group.group_id
                        ));
                    }
                }
            }
            let expected = self.ancestors(&group.group_id).len() as u32;
            if group.level != expected {
                report.errors.push(format!(
                    "group '{}' has level {} but {} ancestors",
                    group.group_id, group.level, expected
                ));
            }
            if group.column_fields.is_empty() && group.child_ids.is_empty() {
                report
                    .warnings
                    .push(format!("group '{}' is empty", group.group_id));
            }
        }
        report.finish()
    }

}
