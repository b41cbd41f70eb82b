//! Reversible mutations and the bounded undo/redo stack.

mod edits;
mod stack;

pub use edits::{BatchEditCommand, CellEdit, LoadRowsCommand, SetCellCommand};
pub use stack::CommandStack;

use gridline_common::GridError;

use crate::data::CellStore;

/// A reversible unit of mutation against the cell store. Redo re-applies.
pub trait Command {
    fn apply(&mut self, store: &mut dyn CellStore) -> Result<(), GridError>;

    fn revert(&mut self, store: &mut dyn CellStore) -> Result<(), GridError>;

    /// Human-readable description, e.g. for an undo menu.
    fn describe(&self) -> String;
}
