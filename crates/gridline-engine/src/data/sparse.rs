//! Coordinate-addressed backend for sparsely populated grids.

use std::ops::Range;

use rustc_hash::FxHashMap;

use gridline_common::{CellCoord, GridError, GridErrorKind, Value};

use super::CellStore;

/// `FxHashMap` from packed coordinate to value. Null writes erase the entry,
/// so the map only ever holds populated cells and space stays O(populated).
#[derive(Debug, Clone, Default)]
pub struct SparseStore {
    cells: FxHashMap<CellCoord, Value>,
    rows: u32,
    cols: u32,
}

impl SparseStore {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            cells: FxHashMap::default(),
            rows,
            cols,
        }
    }
}

impl CellStore for SparseStore {
    fn value_at(&self, row: u32, col: u32) -> Value {
        match CellCoord::try_new(row, col) {
            Ok(coord) => self.cells.get(&coord).cloned().unwrap_or(Value::Null),
            Err(_) => Value::Null,
        }
    }

    fn set_value(&mut self, row: u32, col: u32, value: Value) -> Result<(), GridError> {
        let coord = CellCoord::try_new(row, col).map_err(|e| {
            GridError::new(GridErrorKind::InvalidArgument)
                .with_message(e.to_string())
                .with_location(row, col)
        })?;
        // Writes may land beyond the declared extent; the grid grows.
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
        if value.is_null() {
            self.cells.remove(&coord);
        } else {
            self.cells.insert(coord, value);
        }
        Ok(())
    }

    fn row_count(&self) -> u32 {
        self.rows
    }

    fn col_count(&self) -> u32 {
        self.cols
    }

    fn for_each_in_range(
        &self,
        rows: Range<u32>,
        cols: Range<u32>,
        visitor: &mut dyn FnMut(u32, u32, &Value),
    ) {
        // Hash iteration is unordered; collect matches and sort by the raw
        // packed key, which orders row-major.
        let mut hits: Vec<CellCoord> = self
            .cells
            .keys()
            .filter(|c| rows.contains(&c.row()) && cols.contains(&c.col()))
            .copied()
            .collect();
        hits.sort_unstable();
        for coord in hits {
            if let Some(value) = self.cells.get(&coord) {
                visitor(coord.row(), coord.col(), value);
            }
        }
    }

    fn bulk_load(&mut self, rows: Vec<Vec<Value>>) -> Result<(), GridError> {
        let mut cells = FxHashMap::default();
        let mut max_cols = 0u32;
        for (r, row) in rows.iter().enumerate() {
            max_cols = max_cols.max(row.len() as u32);
            for (c, value) in row.iter().enumerate() {
                if value.is_null() {
                    continue;
                }
                let coord = CellCoord::try_new(r as u32, c as u32).map_err(|e| {
                    GridError::new(GridErrorKind::InvalidArgument)
                        .with_message(e.to_string())
                        .with_location(r as u32, c as u32)
                })?;
                cells.insert(coord, value.clone());
            }
        }
        self.cells = cells;
        self.rows = rows.len() as u32;
        self.cols = self.cols.max(max_cols);
        Ok(())
    }

    fn populated_count(&self) -> usize {
        self.cells.len()
    }
}
