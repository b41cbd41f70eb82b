//! Reactive wrapper holding rows, the sort model, and the last permutation.
//!
//! Every model mutation runs the same pipeline: emit a cancellable
//! `BeforeSort`, recompute (locally or via the backend), then announce
//! `SortChanged` and `AfterSort` once a permutation is in effect. Listeners
//! therefore always observe the post-mutation state when an event reaches
//! them. Invariant: `permutation.len() == rows.len()` except while a backend
//! request is outstanding, in which case the stale permutation is kept and
//! flagged.

use std::cell::Cell;
use std::rc::Rc;

use gridline_common::{FieldPath, GridError, GridErrorKind, Record, Value};

use crate::events::{CancelToken, EventBus, GridEvent};

use super::backend::{BackendResponse, SortBackend, SortTicket};
use super::engine::{apply_permutation, sort_permutation};
use super::model::{SortColumn, SortModel, SortOptions};

struct PendingSort {
    ticket: SortTicket,
    model: SortModel,
}

pub struct SortState {
    rows: Vec<Record>,
    model: SortModel,
    permutation: Vec<u32>,
    options: SortOptions,
    bus: Rc<EventBus>,
    backend: Option<Box<dyn SortBackend>>,
    pending: Option<PendingSort>,
    next_ticket: u64,
    /// Bumped whenever rows or the permutation are replaced; readers cache
    /// derived views against it.
    generation: Cell<u64>,
}

impl SortState {
    pub fn new(bus: Rc<EventBus>, max_sort_columns: usize, options: SortOptions) -> Self {
        Self {
            rows: Vec::new(),
            model: SortModel::with_limit(max_sort_columns),
            permutation: Vec::new(),
            options,
            bus,
            backend: None,
            pending: None,
            next_ticket: 1,
            generation: Cell::new(0),
        }
    }

    /// Install or remove the asynchronous backend. Any outstanding request
    /// is invalidated.
    pub fn set_backend(&mut self, backend: Option<Box<dyn SortBackend>>) {
        self.invalidate_pending("backend replaced");
        self.backend = backend;
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn model(&self) -> &SortModel {
        &self.model
    }

    pub fn permutation(&self) -> &[u32] {
        &self.permutation
    }

    /// Monotonic stamp for caching views derived from rows + permutation.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn bump_generation(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    /// True while a backend request is outstanding and the permutation is
    /// not locally computed.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn visual_to_logical(&self, visual: u32) -> Option<u32> {
        self.permutation.get(visual as usize).copied()
    }

    /// Materialized copy ordered by the last permutation.
    pub fn sorted_rows(&self) -> Vec<Record> {
        apply_permutation(&self.permutation, &self.rows)
    }

    /// Replace the data set and recompute the permutation locally.
    /// A pending backend request is invalidated: its model no longer
    /// describes this data.
    pub fn set_rows(&mut self, rows: Vec<Record>) {
        self.invalidate_pending("data replaced");
        self.rows = rows;
        self.permutation = sort_permutation(&self.rows, &self.model, &self.options);
        self.bump_generation();
    }

    /// Patch one field of one logical row (cell edit write-through).
    /// The permutation is not recomputed; re-sorting after edits is the
    /// caller's call.
    pub fn patch_row(&mut self, row: usize, path: &FieldPath, value: Value) -> bool {
        match self.rows.get_mut(row) {
            Some(record) => {
                record.set_path(path, value);
                self.bump_generation();
                true
            }
            None => false,
        }
    }

    pub fn set_model(&mut self, model: SortModel) -> bool {
        self.model = model;
        self.resort(None)
    }

    pub fn add_column(&mut self, column: SortColumn) -> bool {
        let field = column.field.clone();
        self.model.add_column(column);
        self.resort(Some(field))
    }

    /// No-op returning false when the field is absent from the model.
    pub fn remove_column(&mut self, field: &str) -> bool {
        if !self.model.remove_column(field) {
            return false;
        }
        self.resort(Some(field.to_string()))
    }

    pub fn toggle(&mut self, field: &str) -> bool {
        self.model.toggle(field);
        self.resort(Some(field.to_string()))
    }

    /// Reset the model; emits `SortCleared { previous }` before the usual
    /// sort events.
    pub fn clear(&mut self) -> bool {
        let previous = self.model.clear();
        self.bus.emit(&GridEvent::SortCleared { previous });
        self.resort(None)
    }

    /// Settle an outstanding backend request. Stale tickets are ignored.
    pub fn complete_sort(&mut self, ticket: SortTicket, result: Result<Vec<u32>, GridError>) -> bool {
        let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
            tracing::debug!(?ticket, "ignoring settlement for stale sort ticket");
            return false;
        };
        match result {
            Ok(permutation) if permutation.len() == self.rows.len() => {
                self.permutation = permutation;
                self.bump_generation();
                self.announce(pending.model, None);
                true
            }
            Ok(permutation) => {
                self.emit_error(
                    GridError::new(GridErrorKind::BackendSort).with_message(format!(
                        "backend permutation has {} entries for {} rows",
                        permutation.len(),
                        self.rows.len()
                    )),
                    Some(pending.model),
                );
                false
            }
            Err(error) => {
                self.emit_error(error, Some(pending.model));
                false
            }
        }
    }

    /// Shared resort pipeline. Returns false when cancelled or failed.
    fn resort(&mut self, changed_column: Option<String>) -> bool {
        let cancel = CancelToken::new();
        self.bus.emit(&GridEvent::BeforeSort {
            model: self.model.clone(),
            cancel: cancel.clone(),
        });
        if cancel.is_cancelled() {
            return false;
        }

        if self.backend.is_none() {
            self.permutation = sort_permutation(&self.rows, &self.model, &self.options);
            self.bump_generation();
            self.announce(self.model.clone(), changed_column);
            return true;
        }

        self.invalidate_pending("superseded by newer sort request");
        let ticket = SortTicket(self.next_ticket);
        self.next_ticket += 1;
        let response = match self.backend.as_mut() {
            Some(backend) => backend.on_sort_request(ticket, &self.model),
            None => return false,
        };
        match response {
            Ok(BackendResponse::Completed(permutation))
                if permutation.len() == self.rows.len() =>
            {
                self.permutation = permutation;
                self.bump_generation();
                self.announce(self.model.clone(), changed_column);
                true
            }
            Ok(BackendResponse::Completed(permutation)) => {
                let model = self.model.clone();
                self.emit_error(
                    GridError::new(GridErrorKind::BackendSort).with_message(format!(
                        "backend permutation has {} entries for {} rows",
                        permutation.len(),
                        self.rows.len()
                    )),
                    Some(model),
                );
                false
            }
            Ok(BackendResponse::Pending) => {
                self.pending = Some(PendingSort {
                    ticket,
                    model: self.model.clone(),
                });
                true
            }
            Err(error) => {
                let model = self.model.clone();
                self.emit_error(error, Some(model));
                false
            }
        }
    }

    fn announce(&self, model: SortModel, changed_column: Option<String>) {
        self.bus.emit(&GridEvent::SortChanged {
            model,
            changed_column,
            permutation: self.permutation.clone(),
        });
        self.bus.emit(&GridEvent::AfterSort {
            permutation: self.permutation.clone(),
        });
    }

    fn invalidate_pending(&mut self, reason: &str) {
        if let Some(stale) = self.pending.take() {
            self.emit_error(
                GridError::new(GridErrorKind::BackendSort).with_message(reason),
                Some(stale.model),
            );
        }
    }

    fn emit_error(&self, error: GridError, context: Option<SortModel>) {
        self.bus.emit(&GridEvent::Error { error, context });
    }
}
