//! Bounded undo/redo with timed edit coalescing.
//!
//! Cell edits arriving within the grouping window of the previous edit
//! accumulate in a pending batch; the batch becomes one history entry when
//! it flushes. The flush points are: the window elapsing (checked on the
//! next edit, or driven by the host via [`CommandStack::pending_deadline`]
//! and [`CommandStack::flush_if_due`]), any non-edit command, `undo`,
//! `redo`, or an explicit [`CommandStack::flush_pending`]. `clear` discards
//! the pending batch along with both stacks. Edits apply to the store
//! immediately either way; coalescing only shapes history granularity.

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use gridline_common::GridError;

use crate::clock::Clock;
use crate::data::CellStore;
use crate::events::{EventBus, GridEvent};

use super::edits::{BatchEditCommand, CellEdit, SetCellCommand};
use super::Command;

pub struct CommandStack {
    undo: VecDeque<Box<dyn Command>>,
    redo: VecDeque<Box<dyn Command>>,
    max_history: usize,
    grouping_window: Duration,
    pending: Vec<CellEdit>,
    last_edit_at: Option<Instant>,
    clock: Rc<dyn Clock>,
    bus: Rc<EventBus>,
}

impl CommandStack {
    pub fn new(
        bus: Rc<EventBus>,
        clock: Rc<dyn Clock>,
        max_history: usize,
        grouping_window: Duration,
    ) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_history,
            grouping_window,
            pending: Vec::new(),
            last_edit_at: None,
            clock,
            bus,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.pending.is_empty()
    }

    /// When the pending batch is due to flush; hosts may arm a timer on it.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.last_edit_at
            .filter(|_| !self.pending.is_empty())
            .map(|at| at + self.grouping_window)
    }

    /// Execute a non-edit command: flushes pending edits first, applies,
    /// pushes onto undo, clears redo, evicts the oldest entry past capacity.
    pub fn execute(
        &mut self,
        mut command: Box<dyn Command>,
        store: &mut dyn CellStore,
    ) -> Result<(), GridError> {
        self.flush_pending();
        command.apply(&mut *store)?;
        self.push_applied(command);
        Ok(())
    }

    /// Record one cell edit, applying it to the store immediately. The edit
    /// joins the pending batch when it lands within the grouping window of
    /// the previous edit; otherwise the old batch flushes and a new one
    /// starts.
    pub fn record_cell_edit(
        &mut self,
        edit: CellEdit,
        store: &mut dyn CellStore,
    ) -> Result<(), GridError> {
        let now = self.clock.now();
        let within_window = self
            .last_edit_at
            .is_some_and(|at| now.duration_since(at) <= self.grouping_window);
        if !within_window {
            self.flush_pending();
        }
        store.set_value(edit.row, edit.col, edit.new.clone())?;
        self.pending.push(edit);
        self.last_edit_at = Some(now);
        Ok(())
    }

    /// Flush the pending batch if its deadline has passed.
    pub fn flush_if_due(&mut self) -> bool {
        match self.pending_deadline() {
            Some(deadline) if self.clock.now() >= deadline => {
                self.flush_pending();
                true
            }
            _ => false,
        }
    }

    /// Turn the pending batch into one history entry (single edit or batch).
    /// The edits themselves were applied as they were recorded.
    pub fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let edits = std::mem::take(&mut self.pending);
        self.last_edit_at = None;
        let command: Box<dyn Command> = if edits.len() == 1 {
            let Some(edit) = edits.into_iter().next() else {
                return;
            };
            Box::new(SetCellCommand::new(edit))
        } else {
            Box::new(BatchEditCommand::new(edits))
        };
        self.push_applied(command);
    }

    fn push_applied(&mut self, command: Box<dyn Command>) {
        self.undo.push_back(command);
        self.redo.clear();
        while self.undo.len() > self.max_history {
            self.undo.pop_front();
        }
        self.emit_history_changed();
    }

    /// Undo the newest entry; flushes pending edits first so they are the
    /// thing undone. No-op returning false when history is empty.
    pub fn undo(&mut self, store: &mut dyn CellStore) -> bool {
        self.flush_pending();
        let Some(mut command) = self.undo.pop_back() else {
            return false;
        };
        if let Err(error) = command.revert(&mut *store) {
            tracing::error!(%error, command = %command.describe(), "undo failed; dropping entry");
            self.emit_history_changed();
            return false;
        }
        self.redo.push_back(command);
        self.emit_history_changed();
        true
    }

    pub fn redo(&mut self, store: &mut dyn CellStore) -> bool {
        self.flush_pending();
        let Some(mut command) = self.redo.pop_back() else {
            return false;
        };
        if let Err(error) = command.apply(&mut *store) {
            tracing::error!(%error, command = %command.describe(), "redo failed; dropping entry");
            self.emit_history_changed();
            return false;
        }
        self.undo.push_back(command);
        self.emit_history_changed();
        true
    }

    /// Wipe history. The pending batch is discarded, not flushed: its edits
    /// stay applied but are no longer reversible, matching a cleared history.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.last_edit_at = None;
        self.undo.clear();
        self.redo.clear();
        self.emit_history_changed();
    }

    fn emit_history_changed(&self) {
        self.bus.emit(&GridEvent::HistoryChanged {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_count: self.undo_count(),
            redo_count: self.redo_count(),
        });
    }
}
