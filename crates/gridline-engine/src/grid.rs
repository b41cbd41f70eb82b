//! The grid façade: wires the bus, cell store, axis models, sort state,
//! filter set, command history, and (optionally) column groups behind one
//! surface.
//!
//! Reads are translated through the current view: visual row → logical row
//! via the sort permutation with filtered-out rows dropped. The view is
//! re-derived lazily against the sort state's generation stamp, so a
//! listener that queries the grid from inside a `SortChanged` callback
//! already sees the post-mutation order. Every data-affecting operation is
//! routed through the command stack and is therefore undoable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use gridline_common::{CellRange, FieldPath, GridError, Record, Value};

use crate::axis::AxisModel;
use crate::clock::{Clock, SystemClock};
use crate::commands::{CellEdit, CommandStack, LoadRowsCommand};
use crate::config::GridConfig;
use crate::data::{CellStore, SparseStore};
use crate::events::{AxisKind, EventBus, GridEvent};
use crate::filter::{FilterCondition, FilterSet};
use crate::groups::GroupManager;
use crate::locale::Locale;
use crate::sort::{
    SortBackend, SortColumn, SortModel, SortOptions, SortState, SortTicket,
};
use crate::viewport::{ScrollAlignment, ScrollPosition, Viewport};

/// Maps one grid column onto a record field.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub field: String,
    pub header: String,
    pub width: Option<f64>,
    path: FieldPath,
}

impl ColumnDef {
    pub fn new<F: Into<String>, H: Into<String>>(field: F, header: H) -> Self {
        let field = field.into();
        let path = FieldPath::parse(field.as_str());
        Self {
            field,
            header: header.into(),
            width: None,
            path,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}

pub struct GridEngine {
    config: GridConfig,
    bus: Rc<EventBus>,
    store: Box<dyn CellStore>,
    row_axis: AxisModel,
    col_axis: AxisModel,
    sort: SortState,
    history: CommandStack,
    groups: Option<GroupManager>,
    viewport: Viewport,
    columns: Vec<ColumnDef>,
    filter: FilterSet,
    locale: Locale,
    /// Visual → logical row view (permutation minus filtered rows), derived
    /// lazily against `(sort generation, filter generation)`.
    view: RefCell<Vec<u32>>,
    view_stamp: Cell<(u64, u64)>,
    filter_generation: Cell<u64>,
}

impl GridEngine {
    /// A grid over a sparse store, the default for typical fill factors.
    pub fn new(config: GridConfig, columns: Vec<ColumnDef>) -> Self {
        let store = Box::new(SparseStore::new(0, columns.len() as u32));
        Self::with_store(config, columns, store)
    }

    /// A grid over a caller-chosen backend (e.g. a columnar store).
    pub fn with_store(
        config: GridConfig,
        columns: Vec<ColumnDef>,
        store: Box<dyn CellStore>,
    ) -> Self {
        Self::with_clock(config, columns, store, Rc::new(SystemClock))
    }

    /// Injectable clock for deterministic edit-coalescing tests.
    pub fn with_clock(
        config: GridConfig,
        columns: Vec<ColumnDef>,
        store: Box<dyn CellStore>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let bus = Rc::new(EventBus::new());
        let sort = SortState::new(
            Rc::clone(&bus),
            config.max_sort_columns,
            SortOptions {
                null_ordering: config.null_ordering,
                locale: Locale::invariant(),
            },
        );
        let history = CommandStack::new(
            Rc::clone(&bus),
            clock,
            config.max_history,
            config.grouping_window,
        );
        let mut col_axis = AxisModel::new(columns.len(), config.default_col_width);
        for (i, column) in columns.iter().enumerate() {
            if let Some(width) = column.width {
                let _ = col_axis.set_size(i, width.max(0.0));
            }
        }
        Self {
            row_axis: AxisModel::new(0, config.default_row_height),
            col_axis,
            viewport: Viewport::new(0.0, 0.0, config.overscan_rows, config.overscan_cols),
            sort,
            history,
            groups: None,
            columns,
            filter: FilterSet::default(),
            locale: Locale::invariant(),
            view: RefCell::new(Vec::new()),
            view_stamp: Cell::new((u64::MAX, u64::MAX)),
            filter_generation: Cell::new(0),
            store,
            bus,
            config,
        }
    }

    pub fn bus(&self) -> Rc<EventBus> {
        Rc::clone(&self.bus)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_index(&self, field: &str) -> Option<u32> {
        self.columns
            .iter()
            .position(|c| c.field == field)
            .map(|i| i as u32)
    }

    /* ── data ──────────────────────────────────────────────────────── */

    /// Replace the grid's data. Undoable: the previous cell contents are
    /// captured in the command.
    pub fn set_rows(&mut self, records: Vec<Record>) -> Result<(), GridError> {
        let next: Vec<Vec<Value>> = records.iter().map(|r| self.project_record(r)).collect();
        let previous = self.store.snapshot_rows();
        self.history.execute(
            Box::new(LoadRowsCommand::new(previous, next)),
            self.store.as_mut(),
        )?;
        self.sort.set_rows(records);
        self.sync_row_axis();
        self.bus.emit(&GridEvent::DataChanged { affected: None });
        Ok(())
    }

    fn project_record(&self, record: &Record) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| record.resolve(&c.path).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn records(&self) -> &[Record] {
        self.sort.rows()
    }

    /// Rows currently visible (after filtering).
    pub fn visual_row_count(&self) -> u32 {
        self.ensure_view();
        self.view.borrow().len() as u32
    }

    pub fn logical_row_count(&self) -> u32 {
        self.store.row_count()
    }

    pub fn col_count(&self) -> u32 {
        self.columns.len() as u32
    }

    /// Translate a visual position to the logical row it shows.
    pub fn visual_to_logical(&self, visual: u32) -> Option<u32> {
        self.ensure_view();
        self.view.borrow().get(visual as usize).copied()
    }

    /// Read the cell shown at `(visual_row, col)`.
    pub fn value_at(&self, visual_row: u32, col: u32) -> Value {
        match self.visual_to_logical(visual_row) {
            Some(logical) => self.store.value_at(logical, col),
            None => Value::Null,
        }
    }

    /// Read a cell by logical coordinates, bypassing sort and filter.
    pub fn logical_value_at(&self, row: u32, col: u32) -> Value {
        self.store.value_at(row, col)
    }

    /// Apply cell edits addressed by logical row. Edits within the grouping
    /// window coalesce into a single undo step.
    pub fn update_cells(&mut self, edits: Vec<(u32, u32, Value)>) -> Result<(), GridError> {
        if edits.is_empty() {
            return Ok(());
        }
        let mut affected = CellRange::default();
        for (row, col, new) in edits {
            let old = self.store.value_at(row, col);
            if old == new {
                continue;
            }
            let path = self
                .columns
                .get(col as usize)
                .map(|c| c.path.clone());
            self.history.record_cell_edit(
                CellEdit::new(row, col, old, new.clone()),
                self.store.as_mut(),
            )?;
            if let Some(path) = path {
                self.sort.patch_row(row as usize, &path, new);
            }
            affected = affected.union(&CellRange::new(row, row + 1, col, col + 1));
        }
        if affected.is_empty() {
            return Ok(());
        }
        self.sync_row_axis();
        self.bus.emit(&GridEvent::DataChanged {
            affected: Some(affected),
        });
        Ok(())
    }

    pub fn set_value(&mut self, row: u32, col: u32, value: Value) -> Result<(), GridError> {
        self.update_cells(vec![(row, col, value)])
    }

    /* ── filtering ─────────────────────────────────────────────────── */

    pub fn set_filters(&mut self, conditions: Vec<FilterCondition>) {
        self.filter = FilterSet::new(conditions);
        self.filter_generation.set(self.filter_generation.get() + 1);
        self.sync_row_axis();
        let filtered_count = self.visual_row_count() as usize;
        self.bus.emit(&GridEvent::FilterChanged { filtered_count });
        self.bus.emit(&GridEvent::DataChanged { affected: None });
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(Vec::new());
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filter
    }

    /* ── sorting ───────────────────────────────────────────────────── */

    pub fn sort_model(&self) -> &SortModel {
        self.sort.model()
    }

    pub fn add_sort_column(&mut self, column: SortColumn) -> bool {
        self.sort.add_column(column)
    }

    pub fn remove_sort_column(&mut self, field: &str) -> bool {
        self.sort.remove_column(field)
    }

    pub fn toggle_sort(&mut self, field: &str) -> bool {
        self.sort.toggle(field)
    }

    pub fn set_sort_model(&mut self, model: SortModel) -> bool {
        self.sort.set_model(model)
    }

    pub fn clear_sort(&mut self) -> bool {
        self.sort.clear()
    }

    /// Rows in their current visual order (sorted, unfiltered).
    pub fn sorted_records(&self) -> Vec<Record> {
        self.sort.sorted_rows()
    }

    pub fn permutation(&self) -> &[u32] {
        self.sort.permutation()
    }

    pub fn set_sort_backend(&mut self, backend: Option<Box<dyn SortBackend>>) {
        self.sort.set_backend(backend);
    }

    pub fn complete_sort(
        &mut self,
        ticket: SortTicket,
        result: Result<Vec<u32>, GridError>,
    ) -> bool {
        self.sort.complete_sort(ticket, result)
    }

    pub fn sort_is_pending(&self) -> bool {
        self.sort.is_pending()
    }

    /* ── axes & viewport ───────────────────────────────────────────── */

    pub fn set_row_height(&mut self, index: usize, height: f64) -> Result<(), GridError> {
        self.row_axis.set_size(index, height)?;
        self.bus.emit(&GridEvent::AxisResized {
            axis: AxisKind::Row,
            index: index as u32,
            new_size: height,
        });
        Ok(())
    }

    pub fn set_col_width(&mut self, index: usize, width: f64) -> Result<(), GridError> {
        self.col_axis.set_size(index, width)?;
        self.bus.emit(&GridEvent::AxisResized {
            axis: AxisKind::Column,
            index: index as u32,
            new_size: width,
        });
        Ok(())
    }

    pub fn row_axis(&self) -> &AxisModel {
        &self.row_axis
    }

    pub fn col_axis(&self) -> &AxisModel {
        &self.col_axis
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
    }

    pub fn set_scroll(&mut self, left: f64, top: f64) {
        self.viewport.set_scroll(left, top);
    }

    pub fn visible_range(&self) -> CellRange {
        self.ensure_view();
        self.viewport.visible_range(&self.row_axis, &self.col_axis)
    }

    /// Scroll so `(visual_row, col)` is in view, updating the viewport and
    /// returning the offsets. `None` when out of range.
    pub fn scroll_to(
        &mut self,
        visual_row: usize,
        col: usize,
        alignment: ScrollAlignment,
    ) -> Option<ScrollPosition> {
        self.ensure_view();
        let position =
            self.viewport
                .scroll_to_cell(&self.row_axis, &self.col_axis, visual_row, col, alignment)?;
        self.viewport.set_scroll(position.left, position.top);
        Some(position)
    }

    pub fn cell_at_point(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        self.viewport.cell_at_point(&self.row_axis, &self.col_axis, x, y)
    }

    /* ── history ───────────────────────────────────────────────────── */

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(self.store.as_mut()) {
            return false;
        }
        self.resync_after_history();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(self.store.as_mut()) {
            return false;
        }
        self.resync_after_history();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    pub fn flush_pending_edits(&mut self) {
        self.history.flush_pending();
    }

    pub fn pending_edit_deadline(&self) -> Option<Instant> {
        self.history.pending_deadline()
    }

    pub fn flush_if_due(&mut self) -> bool {
        self.history.flush_if_due()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Rebuild the record mirror from the store after undo/redo moved cell
    /// truth out from under it.
    fn resync_after_history(&mut self) {
        let rows = self.store.row_count();
        let mut records = Vec::with_capacity(rows as usize);
        for row in 0..rows {
            let mut record = Record::new();
            for (col, def) in self.columns.iter().enumerate() {
                let value = self.store.value_at(row, col as u32);
                if !value.is_null() {
                    record.set_path(&def.path, value);
                }
            }
            records.push(record);
        }
        self.sort.set_rows(records);
        self.sync_row_axis();
        self.bus.emit(&GridEvent::DataChanged { affected: None });
    }

    /* ── groups ────────────────────────────────────────────────────── */

    /// Lazily create the column-group manager.
    pub fn groups_mut(&mut self) -> &mut GroupManager {
        let bus = Rc::clone(&self.bus);
        let max_depth = self.config.max_group_depth;
        self.groups
            .get_or_insert_with(|| GroupManager::new(bus, max_depth))
    }

    pub fn groups(&self) -> Option<&GroupManager> {
        self.groups.as_ref()
    }

    /* ── misc ──────────────────────────────────────────────────────── */

    /// Full-invalidate: renderers re-pull everything.
    pub fn refresh(&self) {
        self.bus.emit(&GridEvent::DataChanged { affected: None });
    }

    pub fn populated_cells(&self) -> usize {
        self.store.populated_count()
    }

    pub fn fill_factor(&self) -> f64 {
        self.store.fill_factor()
    }

    /// Tear down: history cleared, pending edits discarded, listeners gone.
    pub fn destroy(&mut self) {
        self.history.clear();
        self.bus.remove_all(None);
        self.view.borrow_mut().clear();
    }

    /* ── internals ─────────────────────────────────────────────────── */

    /// Re-derive the visual view when the sort generation or filter moved.
    fn ensure_view(&self) {
        let stamp = (self.sort.generation(), self.filter_generation.get());
        if self.view_stamp.get() == stamp {
            return;
        }
        let mut view = Vec::with_capacity(self.sort.permutation().len());
        let rows = self.sort.rows();
        for &logical in self.sort.permutation() {
            let passes = match rows.get(logical as usize) {
                Some(record) => self.filter.is_empty() || self.filter.matches(record, &self.locale),
                None => self.filter.is_empty(),
            };
            if passes {
                view.push(logical);
            }
        }
        *self.view.borrow_mut() = view;
        self.view_stamp.set(stamp);
    }

    /// Keep the row axis tracking the visible row count.
    fn sync_row_axis(&mut self) {
        self.ensure_view();
        let count = self.view.borrow().len();
        self.row_axis.set_count(count);
    }
}
