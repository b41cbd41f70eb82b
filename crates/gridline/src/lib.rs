//! Umbrella crate re-exporting the Gridline grid engine.
//!
//! ```
//! use gridline::{ColumnDef, GridConfig, GridEngine, Record, SortColumn, Value};
//!
//! let columns = vec![
//!     ColumnDef::new("name", "Name"),
//!     ColumnDef::new("qty", "Quantity"),
//! ];
//! let mut grid = GridEngine::new(GridConfig::default(), columns);
//! grid.set_rows(vec![
//!     Record::new().with("name", "widget").with("qty", 10i64),
//!     Record::new().with("name", "bolt").with("qty", 3i64),
//! ])
//! .unwrap();
//! grid.add_sort_column(SortColumn::ascending("name"));
//! assert_eq!(grid.value_at(0, 0), Value::Text("bolt".into()));
//! ```

pub use gridline_common::*;
pub use gridline_engine::*;
