//! Engine-wide error representation.
//!
//! - **`GridErrorKind`** : the closed set of failure categories
//! - **`ErrorContext`**  : lightweight location info (cell, group, field)
//! - **`GridError`**     : one struct that glues the two together
//!
//! Invariant-violating inputs are rejected at the API boundary with one of
//! these; internal state is never partially updated. Listener panics are the
//! only failures the engine swallows (they are logged, not returned).

use std::{error::Error, fmt};

/// All recognised failure categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GridErrorKind {
    /// Malformed input: empty group name, non-callable factory slot,
    /// negative index, unknown renderer name.
    InvalidArgument,
    /// Operation referenced a missing group id, sort field, or cell.
    NotFound,
    /// A write disagreed with a columnar lane's declared element kind.
    TypeMismatch,
    /// A group mutation would have produced a parent cycle.
    CycleDetected,
    /// A group insert or re-parent exceeded the configured depth limit.
    MaxDepthExceeded,
    /// A subscribed listener panicked during dispatch. Logged, never returned
    /// to the emitter; carried here so diagnostics can name the category.
    ListenerFailure,
    /// The asynchronous sort backend rejected or superseded a request.
    BackendSort,
}

impl fmt::Display for GridErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidArgument => "invalid argument",
            Self::NotFound => "not found",
            Self::TypeMismatch => "type mismatch",
            Self::CycleDetected => "cycle detected",
            Self::MaxDepthExceeded => "max depth exceeded",
            Self::ListenerFailure => "listener failure",
            Self::BackendSort => "backend sort failure",
        })
    }
}

/// Generic, lightweight metadata any error may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorContext {
    pub row: Option<u32>,
    pub col: Option<u32>,
    pub group_id: Option<String>,
    pub field: Option<String>,
}

impl ErrorContext {
    pub fn is_empty(&self) -> bool {
        self.row.is_none() && self.col.is_none() && self.group_id.is_none() && self.field.is_none()
    }
}

/// The single error struct the engine's APIs pass around.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridError {
    pub kind: GridErrorKind,
    pub message: Option<String>,
    pub context: ErrorContext,
}

impl From<GridErrorKind> for GridError {
    fn from(kind: GridErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: ErrorContext::default(),
        }
    }
}

impl GridError {
    /// Basic constructor (no message, no location).
    pub fn new(kind: GridErrorKind) -> Self {
        kind.into()
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach cell coordinates.
    pub fn with_location(mut self, row: u32, col: u32) -> Self {
        self.context.row = Some(row);
        self.context.col = Some(col);
        self
    }

    /// Attach the offending group id.
    pub fn with_group<S: Into<String>>(mut self, group_id: S) -> Self {
        self.context.group_id = Some(group_id.into());
        self
    }

    /// Attach the offending field name.
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.context.field = Some(field.into());
        self
    }
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }
        if let (Some(r), Some(c)) = (self.context.row, self.context.col) {
            write!(f, " (row {r}, col {c})")?;
        }
        if let Some(ref g) = self.context.group_id {
            write!(f, " [group {g}]")?;
        }
        if let Some(ref field) = self.context.field {
            write!(f, " [field {field}]")?;
        }
        Ok(())
    }
}

impl Error for GridError {}

impl From<GridError> for String {
    fn from(error: GridError) -> Self {
        format!("{error}")
    }
}
