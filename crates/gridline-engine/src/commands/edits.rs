//! Concrete commands: single edits, coalesced batches, bulk loads.

use gridline_common::{GridError, Value};

use crate::data::CellStore;

use super::Command;

/// One cell mutation with both sides captured, so it reverses exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row: u32,
    pub col: u32,
    pub old: Value,
    pub new: Value,
}

impl CellEdit {
    pub fn new(row: u32, col: u32, old: Value, new: Value) -> Self {
        Self { row, col, old, new }
    }
}

#[derive(Debug, Clone)]
pub struct SetCellCommand {
    edit: CellEdit,
}

impl SetCellCommand {
    pub fn new(edit: CellEdit) -> Self {
        Self { edit }
    }
}

impl Command for SetCellCommand {
    fn apply(&mut self, store: &mut dyn CellStore) -> Result<(), GridError> {
        store.set_value(self.edit.row, self.edit.col, self.edit.new.clone())
    }

    fn revert(&mut self, store: &mut dyn CellStore) -> Result<(), GridError> {
        store.set_value(self.edit.row, self.edit.col, self.edit.old.clone())
    }

    fn describe(&self) -> String {
        format!("edit cell ({}, {})", self.edit.row, self.edit.col)
    }
}

/// Several coalesced edits forming one undo step. Revert walks the edits in
/// inverse order so overlapping writes unwind correctly.
#[derive(Debug, Clone)]
pub struct BatchEditCommand {
    edits: Vec<CellEdit>,
}

impl BatchEditCommand {
    pub fn new(edits: Vec<CellEdit>) -> Self {
        Self { edits }
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

impl Command for BatchEditCommand {
    fn apply(&mut self, store: &mut dyn CellStore) -> Result<(), GridError> {
        for edit in &self.edits {
            store.set_value(edit.row, edit.col, edit.new.clone())?;
        }
        Ok(())
    }

    fn revert(&mut self, store: &mut dyn CellStore) -> Result<(), GridError> {
        for edit in self.edits.iter().rev() {
            store.set_value(edit.row, edit.col, edit.old.clone())?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("edit {} cells", self.edits.len())
    }
}

/// Full data replacement carrying both snapshots.
#[derive(Debug, Clone)]
pub struct LoadRowsCommand {
    previous: Vec<Vec<Value>>,
    next: Vec<Vec<Value>>,
}

impl LoadRowsCommand {
    pub fn new(previous: Vec<Vec<Value>>, next: Vec<Vec<Value>>) -> Self {
        Self { previous, next }
    }
}

impl Command for LoadRowsCommand {
    fn apply(&mut self, store: &mut dyn CellStore) -> Result<(), GridError> {
        store.bulk_load(self.next.clone())
    }

    fn revert(&mut self, store: &mut dyn CellStore) -> Result<(), GridError> {
        store.bulk_load(self.previous.clone())
    }

    fn describe(&self) -> String {
        format!("load {} rows", self.next.len())
    }
}
