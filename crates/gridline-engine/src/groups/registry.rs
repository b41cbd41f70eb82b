//! Name-indexed renderer factories for group headers.
//!
//! The registry is plain owned state: the group manager carries one, and
//! callers that want to share renderers across grids construct their own and
//! hand it over. The `"default"` entry always exists; `unregister` refuses to
//! remove it and `clear` re-seeds it.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use gridline_common::{GridError, GridErrorKind};

use super::model::ColumnGroup;
use super::query::GroupQuery;

pub const DEFAULT_RENDERER: &str = "default";

/// Options handed to a factory when instantiating a renderer.
#[derive(Debug, Clone)]
pub struct RendererOptions {
    /// Append the spanned-column count to the header title.
    pub show_column_count: bool,
    /// Indent the title by level when producing the header view.
    pub indent_by_level: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            show_column_count: true,
            indent_by_level: false,
        }
    }
}

/// Headless visual element for one group header. Hosts translate this into
/// DOM nodes, TUI cells, or whatever their surface is; toggle intents are
/// routed back through the manager using `group_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHeaderView {
    pub group_id: String,
    pub title: String,
    pub level: u32,
    pub expanded: bool,
    pub column_count: usize,
    pub child_count: usize,
}

pub trait GroupRenderer {
    fn render(&self, group: &ColumnGroup, query: &GroupQuery<'_>) -> GroupHeaderView;
}

pub type RendererFactory = Rc<dyn Fn(&RendererOptions) -> Box<dyn GroupRenderer>>;

/// Built-in renderer; what `"default"` resolves to.
pub struct DefaultGroupRenderer {
    options: RendererOptions,
}

impl DefaultGroupRenderer {
    pub fn new(options: RendererOptions) -> Self {
        Self { options }
    }
}

impl GroupRenderer for DefaultGroupRenderer {
    fn render(&self, group: &ColumnGroup, query: &GroupQuery<'_>) -> GroupHeaderView {
        let mut title = String::new();
        if self.options.indent_by_level {
            for _ in 0..group.level {
                title.push_str("  ");
            }
        }
        title.push_str(&group.header_name);
        if self.options.show_column_count && !group.column_fields.is_empty() {
            title.push_str(&format!(" ({})", group.column_fields.len()));
        }
        GroupHeaderView {
            group_id: group.group_id.clone(),
            title,
            level: group.level,
            expanded: query.is_expanded(&group.group_id).unwrap_or(group.expanded),
            column_count: group.column_fields.len(),
            child_count: group.child_ids.len(),
        }
    }
}

pub struct RendererRegistry {
    factories: FxHashMap<String, RendererFactory>,
    default_name: String,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: FxHashMap::default(),
            default_name: DEFAULT_RENDERER.to_string(),
        };
        registry.seed_default();
        registry
    }

    fn seed_default(&mut self) {
        self.factories.insert(
            DEFAULT_RENDERER.to_string(),
            Rc::new(|options: &RendererOptions| {
                Box::new(DefaultGroupRenderer::new(options.clone())) as Box<dyn GroupRenderer>
            }),
        );
    }

    /// Register a factory under `name`. Re-registration warns and overwrites.
    pub fn register<S: Into<String>>(
        &mut self,
        name: S,
        factory: RendererFactory,
    ) -> Result<(), GridError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message("renderer name must not be empty"));
        }
        if self.factories.contains_key(&name) {
            tracing::warn!(renderer = %name, "overwriting previously registered renderer");
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Remove a factory. Refuses to remove `"default"`.
    pub fn unregister(&mut self, name: &str) -> bool {
        if name == DEFAULT_RENDERER {
            tracing::warn!("refusing to unregister the default renderer");
            return false;
        }
        if self.default_name == name {
            self.default_name = DEFAULT_RENDERER.to_string();
        }
        self.factories.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate a renderer by name.
    pub fn get(&self, name: &str, options: &RendererOptions) -> Option<Box<dyn GroupRenderer>> {
        self.factories.get(name).map(|factory| factory(options))
    }

    /// Make `name` the registry default; it must be registered.
    pub fn set_default(&mut self, name: &str) -> Result<(), GridError> {
        if !self.factories.contains_key(name) {
            return Err(GridError::new(GridErrorKind::NotFound)
                .with_message(format!("renderer '{name}' is not registered")));
        }
        self.default_name = name.to_string();
        Ok(())
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Instantiate the default renderer. Falls back to the built-in when the
    /// configured default has been removed out from under us.
    pub fn default_renderer(&self, options: &RendererOptions) -> Box<dyn GroupRenderer> {
        if let Some(renderer) = self.get(&self.default_name, options) {
            return renderer;
        }
        Box::new(DefaultGroupRenderer::new(options.clone()))
    }

    /// Drop every registration except `"default"` and reset the default name.
    pub fn clear(&mut self) {
        self.factories.clear();
        self.default_name = DEFAULT_RENDERER.to_string();
        self.seed_default();
    }
}
