//! Typed-column backend for dense grids.
//!
//! Each column is declared with an element kind at construction and owns a
//! contiguous lane of optional values of that kind. The column set is fixed;
//! rows grow on demand and may be inserted or removed mid-table, shifting
//! every lane (O(rows × cols), batched through `insert_rows`/`remove_rows`).

use std::ops::Range;

use chrono::NaiveDateTime;

use gridline_common::{GridError, GridErrorKind, Value, ValueKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::CellStore;

/// Declared element kind of a columnar lane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Int,
    Number,
    Bool,
    Text,
    Timestamp,
}

impl ColumnKind {
    /// Whether a value of `kind` may be written into this lane. `Int` widens
    /// into `Number` lanes; everything else is exact. Nulls are always
    /// accepted (they clear the slot).
    fn accepts(self, kind: ValueKind) -> bool {
        match (self, kind) {
            (_, ValueKind::Null) => true,
            (ColumnKind::Int, ValueKind::Int) => true,
            (ColumnKind::Number, ValueKind::Number | ValueKind::Int) => true,
            (ColumnKind::Bool, ValueKind::Bool) => true,
            (ColumnKind::Text, ValueKind::Text) => true,
            (ColumnKind::Timestamp, ValueKind::Timestamp) => true,
            _ => false,
        }
    }
}

/// One column descriptor: name plus declared element kind.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new<S: Into<String>>(name: S, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
enum Lane {
    Int(Vec<Option<i64>>),
    Number(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl Lane {
    fn for_kind(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Int => Lane::Int(Vec::new()),
            ColumnKind::Number => Lane::Number(Vec::new()),
            ColumnKind::Bool => Lane::Bool(Vec::new()),
            ColumnKind::Text => Lane::Text(Vec::new()),
            ColumnKind::Timestamp => Lane::Timestamp(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            Lane::Int(v) => v.len(),
            Lane::Number(v) => v.len(),
            Lane::Bool(v) => v.len(),
            Lane::Text(v) => v.len(),
            Lane::Timestamp(v) => v.len(),
        }
    }

    fn resize(&mut self, len: usize) {
        match self {
            Lane::Int(v) => v.resize(len, None),
            Lane::Number(v) => v.resize(len, None),
            Lane::Bool(v) => v.resize(len, None),
            Lane::Text(v) => v.resize(len, None),
            Lane::Timestamp(v) => v.resize(len, None),
        }
    }

    fn insert_gap(&mut self, at: usize, count: usize) {
        fn gap<T: Clone>(v: &mut Vec<Option<T>>, at: usize, count: usize) {
            v.splice(at..at, std::iter::repeat_n(None, count));
        }
        match self {
            Lane::Int(v) => gap(v, at, count),
            Lane::Number(v) => gap(v, at, count),
            Lane::Bool(v) => gap(v, at, count),
            Lane::Text(v) => gap(v, at, count),
            Lane::Timestamp(v) => gap(v, at, count),
        }
    }

    fn drain(&mut self, range: Range<usize>) {
        match self {
            Lane::Int(v) => drop(v.drain(range)),
            Lane::Number(v) => drop(v.drain(range)),
            Lane::Bool(v) => drop(v.drain(range)),
            Lane::Text(v) => drop(v.drain(range)),
            Lane::Timestamp(v) => drop(v.drain(range)),
        }
    }

    fn get(&self, row: usize) -> Value {
        match self {
            Lane::Int(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Int),
            Lane::Number(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Number),
            Lane::Bool(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Bool),
            Lane::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Value::Null, Value::Text),
            Lane::Timestamp(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Timestamp),
        }
    }

    fn is_populated(&self, row: usize) -> bool {
        match self {
            Lane::Int(v) => matches!(v.get(row), Some(Some(_))),
            Lane::Number(v) => matches!(v.get(row), Some(Some(_))),
            Lane::Bool(v) => matches!(v.get(row), Some(Some(_))),
            Lane::Text(v) => matches!(v.get(row), Some(Some(_))),
            Lane::Timestamp(v) => matches!(v.get(row), Some(Some(_))),
        }
    }

    /// Caller has already verified the kind via [`ColumnKind::accepts`].
    fn put(&mut self, row: usize, value: Value) {
        match (self, value) {
            (Lane::Int(v), Value::Int(x)) => v[row] = Some(x),
            (Lane::Number(v), Value::Number(x)) => v[row] = Some(x),
            (Lane::Number(v), Value::Int(x)) => v[row] = Some(x as f64),
            (Lane::Bool(v), Value::Bool(x)) => v[row] = Some(x),
            (Lane::Text(v), Value::Text(x)) => v[row] = Some(x),
            (Lane::Timestamp(v), Value::Timestamp(x)) => v[row] = Some(x),
            (Lane::Int(v), Value::Null) => v[row] = None,
            (Lane::Number(v), Value::Null) => v[row] = None,
            (Lane::Bool(v), Value::Null) => v[row] = None,
            (Lane::Text(v), Value::Null) => v[row] = None,
            (Lane::Timestamp(v), Value::Null) => v[row] = None,
            _ => unreachable!("kind checked before put"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnarStore {
    specs: Vec<ColumnSpec>,
    lanes: Vec<Lane>,
    rows: u32,
}

impl ColumnarStore {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        let lanes = specs.iter().map(|s| Lane::for_kind(s.kind)).collect();
        Self {
            specs,
            lanes,
            rows: 0,
        }
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn column_kind(&self, col: u32) -> Option<ColumnKind> {
        self.specs.get(col as usize).map(|s| s.kind)
    }

    pub fn column_index(&self, name: &str) -> Option<u32> {
        self.specs.iter().position(|s| s.name == name).map(|i| i as u32)
    }

    fn ensure_rows(&mut self, rows: u32) {
        if rows <= self.rows {
            return;
        }
        for lane in &mut self.lanes {
            lane.resize(rows as usize);
        }
        self.rows = rows;
    }

    /// Insert `count` empty rows before `at`, shifting everything below.
    pub fn insert_rows(&mut self, at: u32, count: u32) -> Result<(), GridError> {
        if at > self.rows {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message(format!("insert position {at} beyond row count {}", self.rows)));
        }
        for lane in &mut self.lanes {
            lane.insert_gap(at as usize, count as usize);
        }
        self.rows += count;
        Ok(())
    }

    /// Remove the rows in `range`, shifting everything below up.
    pub fn remove_rows(&mut self, range: Range<u32>) -> Result<(), GridError> {
        if range.end > self.rows || range.start > range.end {
            return Err(GridError::new(GridErrorKind::InvalidArgument)
                .with_message(format!("row range {range:?} out of bounds")));
        }
        let removed = range.end - range.start;
        for lane in &mut self.lanes {
            lane.drain(range.start as usize..range.end as usize);
        }
        self.rows -= removed;
        Ok(())
    }
}

impl CellStore for ColumnarStore {
    fn value_at(&self, row: u32, col: u32) -> Value {
        match self.lanes.get(col as usize) {
            Some(lane) => lane.get(row as usize),
            None => Value::Null,
        }
    }

    fn set_value(&mut self, row: u32, col: u32, value: Value) -> Result<(), GridError> {
        let Some(spec) = self.specs.get(col as usize) else {
            return Err(GridError::new(GridErrorKind::NotFound)
                .with_message(format!("no column {col} declared"))
                .with_location(row, col));
        };
        if !spec.kind.accepts(value.kind()) {
            return Err(GridError::new(GridErrorKind::TypeMismatch)
                .with_message(format!(
                    "column '{}' holds {:?}, got {}",
                    spec.name,
                    spec.kind,
                    value.kind()
                ))
                .with_location(row, col));
        }
        self.ensure_rows(row + 1);
        self.lanes[col as usize].put(row as usize, value);
        Ok(())
    }

    fn row_count(&self) -> u32 {
        self.rows
    }

    fn col_count(&self) -> u32 {
        self.specs.len() as u32
    }

    fn for_each_in_range(
        &self,
        rows: Range<u32>,
        cols: Range<u32>,
        visitor: &mut dyn FnMut(u32, u32, &Value),
    ) {
        let row_end = rows.end.min(self.rows);
        let col_end = cols.end.min(self.specs.len() as u32);
        for row in rows.start..row_end {
            for col in cols.start..col_end {
                let lane = &self.lanes[col as usize];
                if lane.is_populated(row as usize) {
                    let value = lane.get(row as usize);
                    visitor(row, col, &value);
                }
            }
        }
    }

    fn bulk_load(&mut self, rows: Vec<Vec<Value>>) -> Result<(), GridError> {
        let mut fresh: Vec<Lane> = self.specs.iter().map(|s| Lane::for_kind(s.kind)).collect();
        let row_count = rows.len();
        for lane in &mut fresh {
            lane.resize(row_count);
        }
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() > self.specs.len() {
                return Err(GridError::new(GridErrorKind::InvalidArgument).with_message(format!(
                    "row {r} has {} cells but only {} columns are declared",
                    row.len(),
                    self.specs.len()
                )));
            }
            for (c, value) in row.into_iter().enumerate() {
                if !self.specs[c].kind.accepts(value.kind()) {
                    return Err(GridError::new(GridErrorKind::TypeMismatch)
                        .with_message(format!(
                            "column '{}' holds {:?}, got {}",
                            self.specs[c].name,
                            self.specs[c].kind,
                            value.kind()
                        ))
                        .with_location(r as u32, c as u32));
                }
                fresh[c].put(r, value);
            }
        }
        self.lanes = fresh;
        self.rows = row_count as u32;
        Ok(())
    }

    fn populated_count(&self) -> usize {
        let mut count = 0;
        for lane in &self.lanes {
            for row in 0..self.rows as usize {
                if lane.is_populated(row) {
                    count += 1;
                }
            }
        }
        count
    }
}
