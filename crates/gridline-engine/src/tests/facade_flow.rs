//! Full-surface flows through the grid façade.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gridline_common::{GridErrorKind, Record, Value};

use crate::clock::ManualClock;
use crate::config::GridConfig;
use crate::data::{ColumnKind, ColumnSpec, ColumnarStore, SparseStore};
use crate::events::{EventKind, GridEvent};
use crate::filter::{FilterCondition, FilterOp};
use crate::grid::{ColumnDef, GridEngine};
use crate::sort::SortColumn;
use crate::viewport::ScrollAlignment;

fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("d", "Department"),
        ColumnDef::new("r", "Region"),
        ColumnDef::new("n", "Name"),
    ]
}

fn departments() -> Vec<Record> {
    vec![
        Record::new().with("d", "Sales").with("r", "North").with("n", "Charlie"),
        Record::new().with("d", "Sales").with("r", "North").with("n", "Alice"),
        Record::new().with("d", "Sales").with("r", "South").with("n", "Bob"),
        Record::new().with("d", "Eng").with("r", "East").with("n", "David"),
        Record::new().with("d", "Eng").with("r", "East").with("n", "Eve"),
    ]
}

fn grid() -> GridEngine {
    let mut grid = GridEngine::new(GridConfig::default(), columns());
    grid.set_rows(departments()).unwrap();
    grid
}

fn names_in_visual_order(grid: &GridEngine) -> Vec<String> {
    (0..grid.visual_row_count())
        .map(|v| grid.value_at(v, 2).to_string())
        .collect()
}

#[test]
fn unsorted_grid_reads_in_load_order() {
    let grid = grid();
    assert_eq!(grid.visual_row_count(), 5);
    assert_eq!(grid.col_count(), 3);
    assert_eq!(
        names_in_visual_order(&grid),
        vec!["Charlie", "Alice", "Bob", "David", "Eve"]
    );
}

#[test]
fn multi_key_sort_reads_through_the_permutation() {
    let mut grid = grid();
    grid.add_sort_column(SortColumn::ascending("n"));
    grid.add_sort_column(SortColumn::ascending("r"));
    grid.add_sort_column(SortColumn::ascending("d"));

    assert_eq!(grid.permutation(), &[3, 4, 1, 0, 2]);
    assert_eq!(
        names_in_visual_order(&grid),
        vec!["David", "Eve", "Alice", "Charlie", "Bob"]
    );
    assert_eq!(grid.visual_to_logical(0), Some(3));
}

#[test]
fn listeners_observe_post_mutation_state() {
    // Event causality: payloads are emitted after the mutation is fully
    // applied, so what a listener captures during dispatch must equal what
    // the engine reports when queried afterwards.
    let mut grid = grid();

    let observed: Rc<RefCell<Vec<Vec<u32>>>> = Rc::default();
    let sink = Rc::clone(&observed);
    grid.bus().subscribe(EventKind::SortChanged, move |event| {
        if let GridEvent::SortChanged { permutation, .. } = event {
            sink.borrow_mut().push(permutation.clone());
        }
    });

    grid.add_sort_column(SortColumn::ascending("d"));
    let during_dispatch = observed.borrow()[0].clone();
    assert_eq!(during_dispatch, grid.permutation());
    assert_eq!(grid.value_at(0, 2), Value::Text("David".into()));
}

#[test]
fn cell_edits_coalesce_and_round_trip_through_undo() {
    let clock = Rc::new(ManualClock::new());
    let config = GridConfig {
        grouping_window: Duration::from_millis(1000),
        ..GridConfig::default()
    };
    let store = Box::new(SparseStore::new(0, 3));
    let mut grid = GridEngine::with_clock(config, columns(), store, clock.clone());
    grid.set_rows(departments()).unwrap();
    let loads = grid.undo_count(); // the bulk load itself is one entry

    grid.set_value(0, 2, Value::Text("Carl".into())).unwrap();
    clock.advance(Duration::from_millis(200));
    grid.set_value(0, 2, Value::Text("Carlos".into())).unwrap();
    grid.flush_pending_edits();

    assert_eq!(grid.undo_count(), loads + 1);
    assert_eq!(grid.logical_value_at(0, 2), Value::Text("Carlos".into()));

    assert!(grid.undo());
    assert_eq!(grid.logical_value_at(0, 2), Value::Text("Charlie".into()));
    assert!(grid.redo());
    assert_eq!(grid.logical_value_at(0, 2), Value::Text("Carlos".into()));
}

#[test]
fn undo_restores_sort_input_too() {
    let mut grid = grid();
    grid.add_sort_column(SortColumn::ascending("n"));
    // "Alice" leads; rename her to "Zoe" and re-sort.
    let alice_logical = grid.visual_to_logical(0).unwrap();
    assert_eq!(grid.value_at(0, 2), Value::Text("Alice".into()));
    grid.set_value(alice_logical, 2, Value::Text("Zoe".into())).unwrap();
    grid.flush_pending_edits();
    grid.add_sort_column(SortColumn::ascending("n"));
    assert_eq!(grid.value_at(0, 2), Value::Text("Bob".into()));

    // Undo the rename: the record mirror resyncs from the store, and the
    // next sort sees the original name again.
    assert!(grid.undo());
    grid.add_sort_column(SortColumn::ascending("n"));
    assert_eq!(grid.value_at(0, 2), Value::Text("Alice".into()));
}

#[test]
fn set_rows_is_undoable() {
    let mut grid = grid();
    grid.set_rows(vec![Record::new().with("d", "Ops").with("n", "Zed")])
        .unwrap();
    assert_eq!(grid.visual_row_count(), 1);
    assert!(grid.undo());
    assert_eq!(grid.visual_row_count(), 5);
    assert_eq!(grid.logical_value_at(0, 2), Value::Text("Charlie".into()));
}

#[test]
fn filters_compose_with_sorting() {
    let mut grid = grid();
    grid.add_sort_column(SortColumn::ascending("n"));
    assert_eq!(
        names_in_visual_order(&grid),
        vec!["Alice", "Bob", "Charlie", "David", "Eve"]
    );

    let filtered: Rc<RefCell<Vec<usize>>> = Rc::default();
    let sink = Rc::clone(&filtered);
    grid.bus().subscribe(EventKind::FilterChanged, move |event| {
        if let GridEvent::FilterChanged { filtered_count } = event {
            sink.borrow_mut().push(*filtered_count);
        }
    });

    grid.set_filters(vec![FilterCondition::new(
        "d",
        FilterOp::Equals,
        Value::Text("Sales".into()),
    )]);
    assert_eq!(*filtered.borrow(), vec![3]);
    assert_eq!(names_in_visual_order(&grid), vec!["Alice", "Bob", "Charlie"]);
    // Row axis follows the visible row count.
    assert_eq!(grid.visual_row_count(), 3);

    grid.clear_filters();
    assert_eq!(grid.visual_row_count(), 5);
}

#[test]
fn axis_resize_emits_and_updates_extents() {
    let mut grid = grid();
    let resized: Rc<RefCell<Vec<(u32, f64)>>> = Rc::default();
    let sink = Rc::clone(&resized);
    grid.bus().subscribe(EventKind::AxisResized, move |event| {
        if let GridEvent::AxisResized { index, new_size, .. } = event {
            sink.borrow_mut().push((*index, *new_size));
        }
    });

    grid.set_row_height(2, 60.0).unwrap();
    assert_eq!(*resized.borrow(), vec![(2, 60.0)]);
    assert_eq!(grid.row_axis().total_extent(), 4.0 * 30.0 + 60.0);

    let err = grid.set_row_height(99, 10.0).unwrap_err();
    assert_eq!(err.kind, GridErrorKind::InvalidArgument);
}

#[test]
fn scroll_to_updates_the_viewport() {
    let mut grid = grid();
    grid.set_viewport_size(300.0, 60.0);
    let pos = grid.scroll_to(4, 0, ScrollAlignment::Start).unwrap();
    assert_eq!(pos.top, 5.0 * 30.0 - 60.0); // clamped to max scroll
    let range = grid.visible_range();
    assert!(range.contains(4, 0));
}

#[test]
fn columnar_store_enforces_kinds_through_the_facade() {
    let specs = vec![
        ColumnSpec::new("d", ColumnKind::Text),
        ColumnSpec::new("r", ColumnKind::Text),
        ColumnSpec::new("n", ColumnKind::Text),
    ];
    let mut grid = GridEngine::with_store(
        GridConfig::default(),
        columns(),
        Box::new(ColumnarStore::new(specs)),
    );
    grid.set_rows(departments()).unwrap();
    assert_eq!(grid.value_at(0, 0), Value::Text("Sales".into()));

    let err = grid.set_value(0, 0, Value::Int(5)).unwrap_err();
    assert_eq!(err.kind, GridErrorKind::TypeMismatch);
}

#[test]
fn groups_are_reachable_through_the_facade() {
    let mut grid = grid();
    let toggled: Rc<RefCell<Vec<bool>>> = Rc::default();
    let sink = Rc::clone(&toggled);
    grid.bus().subscribe(EventKind::GroupToggled, move |event| {
        if let GridEvent::GroupToggled { expanded, .. } = event {
            sink.borrow_mut().push(*expanded);
        }
    });

    let groups = grid.groups_mut();
    groups
        .add_group(crate::groups::ColumnGroup::new("geo", "Geography").with_fields(["r"]))
        .unwrap();
    groups.collapse_group("geo");
    assert_eq!(*toggled.borrow(), vec![false]);
    assert_eq!(grid.groups().unwrap().is_expanded("geo"), Some(false));
}

#[test]
fn destroy_drops_listeners_and_history() {
    let mut grid = grid();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    grid.bus().subscribe(EventKind::DataChanged, move |_| {
        *sink.borrow_mut() += 1;
    });

    grid.destroy();
    assert!(!grid.can_undo());
    grid.refresh();
    assert_eq!(*count.borrow(), 0);
}

#[test]
fn refresh_is_a_full_invalidation() {
    let grid = grid();
    let payloads: Rc<RefCell<Vec<bool>>> = Rc::default();
    let sink = Rc::clone(&payloads);
    grid.bus().subscribe(EventKind::DataChanged, move |event| {
        if let GridEvent::DataChanged { affected } = event {
            sink.borrow_mut().push(affected.is_none());
        }
    });
    grid.refresh();
    assert_eq!(*payloads.borrow(), vec![true]);
}

#[test]
fn update_cells_reports_the_affected_range() {
    let mut grid = grid();
    let ranges: Rc<RefCell<Vec<gridline_common::CellRange>>> = Rc::default();
    let sink = Rc::clone(&ranges);
    grid.bus().subscribe(EventKind::DataChanged, move |event| {
        if let GridEvent::DataChanged { affected: Some(r) } = event {
            sink.borrow_mut().push(*r);
        }
    });

    grid.update_cells(vec![
        (1, 0, Value::Text("Ops".into())),
        (3, 2, Value::Text("Dina".into())),
    ])
    .unwrap();

    let seen = ranges.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains(1, 0));
    assert!(seen[0].contains(3, 2));
    assert!(!seen[0].contains(4, 0));
}
