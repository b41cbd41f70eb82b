//! Command-stack behavior: coalescing, capacity, and history events.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gridline_common::Value;

use crate::clock::{Clock, ManualClock};
use crate::commands::{CellEdit, CommandStack, LoadRowsCommand};
use crate::data::{CellStore, SparseStore};
use crate::events::{EventBus, EventKind, GridEvent};

fn fixture() -> (Rc<EventBus>, Rc<ManualClock>, CommandStack, SparseStore) {
    let bus = Rc::new(EventBus::new());
    let clock = Rc::new(ManualClock::new());
    let stack = CommandStack::new(
        Rc::clone(&bus),
        clock.clone(),
        100,
        Duration::from_millis(1000),
    );
    (bus, clock, stack, SparseStore::new(4, 4))
}

fn edit(row: u32, col: u32, old: &str, new: &str) -> CellEdit {
    let old = if old.is_empty() {
        Value::Null
    } else {
        Value::Text(old.into())
    };
    CellEdit::new(row, col, old, Value::Text(new.into()))
}

#[test]
fn rapid_edits_coalesce_into_one_undo_step() {
    let (_bus, clock, mut stack, mut store) = fixture();
    store.set_value(0, 0, Value::Text("A".into())).unwrap();

    stack.record_cell_edit(edit(0, 0, "A", "B"), &mut store).unwrap();
    clock.advance(Duration::from_millis(200));
    stack.record_cell_edit(edit(0, 0, "B", "C"), &mut store).unwrap();
    stack.flush_pending();

    assert!(stack.can_undo());
    assert_eq!(stack.undo_count(), 1);
    assert_eq!(store.value_at(0, 0), Value::Text("C".into()));

    assert!(stack.undo(&mut store));
    assert_eq!(store.value_at(0, 0), Value::Text("A".into()));
    assert!(stack.redo(&mut store));
    assert_eq!(store.value_at(0, 0), Value::Text("C".into()));
}

#[test]
fn edits_outside_the_window_form_separate_steps() {
    let (_bus, clock, mut stack, mut store) = fixture();

    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();
    clock.advance(Duration::from_millis(1500));
    stack.record_cell_edit(edit(0, 0, "B", "C"), &mut store).unwrap();
    stack.flush_pending();

    assert_eq!(stack.undo_count(), 2);
}

#[test]
fn single_pending_edit_flushes_to_a_plain_set_command() {
    let (_bus, _clock, mut stack, mut store) = fixture();
    stack.record_cell_edit(edit(1, 1, "", "X"), &mut store).unwrap();
    stack.flush_pending();
    assert_eq!(stack.undo_count(), 1);
    assert!(stack.undo(&mut store));
    assert_eq!(store.value_at(1, 1), Value::Null);
}

#[test]
fn batch_undo_reverses_in_inverse_order() {
    let (_bus, _clock, mut stack, mut store) = fixture();
    // Two edits to the same cell within one batch; inverse-order revert must
    // land on the first edit's old value.
    stack.record_cell_edit(edit(2, 2, "", "one"), &mut store).unwrap();
    stack
        .record_cell_edit(edit(2, 2, "one", "two"), &mut store)
        .unwrap();
    stack.flush_pending();
    assert!(stack.undo(&mut store));
    assert_eq!(store.value_at(2, 2), Value::Null);
}

#[test]
fn undo_flushes_pending_first() {
    let (_bus, _clock, mut stack, mut store) = fixture();
    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();
    // No explicit flush: undo itself must flush, then revert that batch.
    assert!(stack.undo(&mut store));
    assert_eq!(store.value_at(0, 0), Value::Null);
    assert!(stack.can_redo());
}

#[test]
fn non_edit_command_flushes_pending() {
    let (_bus, _clock, mut stack, mut store) = fixture();
    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();
    stack
        .execute(
            Box::new(LoadRowsCommand::new(
                store.snapshot_rows(),
                vec![vec![Value::Int(1)]],
            )),
            &mut store,
        )
        .unwrap();
    // The pending edit became its own entry before the load executed.
    assert_eq!(stack.undo_count(), 2);
}

#[test]
fn deadline_is_exposed_and_flush_if_due_honors_it() {
    let (_bus, clock, mut stack, mut store) = fixture();
    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();

    let deadline = stack.pending_deadline().unwrap();
    assert!(deadline > clock.now());
    assert!(!stack.flush_if_due());

    clock.advance(Duration::from_millis(1001));
    assert!(stack.flush_if_due());
    assert_eq!(stack.undo_count(), 1);
    assert_eq!(stack.pending_deadline(), None);
}

#[test]
fn capacity_evicts_oldest_first() {
    let bus = Rc::new(EventBus::new());
    let clock = Rc::new(ManualClock::new());
    let mut stack = CommandStack::new(bus, clock.clone(), 2, Duration::from_millis(10));
    let mut store = SparseStore::new(4, 4);

    for i in 0..3 {
        stack
            .record_cell_edit(
                CellEdit::new(0, i, Value::Null, Value::Int(i64::from(i))),
                &mut store,
            )
            .unwrap();
        clock.advance(Duration::from_millis(50));
        stack.flush_pending();
    }
    assert_eq!(stack.undo_count(), 2);

    // Two undos unwind the two newest edits; the first is unreachable.
    assert!(stack.undo(&mut store));
    assert!(stack.undo(&mut store));
    assert!(!stack.undo(&mut store));
    assert_eq!(store.value_at(0, 0), Value::Int(0));
    assert_eq!(store.value_at(0, 1), Value::Null);
    assert_eq!(store.value_at(0, 2), Value::Null);
}

#[test]
fn new_command_clears_redo() {
    let (_bus, clock, mut stack, mut store) = fixture();
    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();
    stack.flush_pending();
    assert!(stack.undo(&mut store));
    assert!(stack.can_redo());

    clock.advance(Duration::from_millis(2000));
    stack.record_cell_edit(edit(0, 1, "", "Z"), &mut store).unwrap();
    stack.flush_pending();
    assert!(!stack.can_redo());
}

#[test]
fn clear_discards_pending_and_history() {
    let (_bus, _clock, mut stack, mut store) = fixture();
    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();
    stack.clear();
    assert!(!stack.can_undo());
    assert!(!stack.has_pending_edits());
    // The edit itself stays applied; it is just no longer reversible.
    assert_eq!(store.value_at(0, 0), Value::Text("B".into()));
}

#[test]
fn history_changed_reports_counters() {
    let (bus, _clock, mut stack, mut store) = fixture();
    let seen: Rc<RefCell<Vec<(bool, bool, usize, usize)>>> = Rc::default();
    let sink = Rc::clone(&seen);
    bus.subscribe(EventKind::HistoryChanged, move |event| {
        if let GridEvent::HistoryChanged {
            can_undo,
            can_redo,
            undo_count,
            redo_count,
        } = event
        {
            sink.borrow_mut()
                .push((*can_undo, *can_redo, *undo_count, *redo_count));
        }
    });

    stack.record_cell_edit(edit(0, 0, "", "B"), &mut store).unwrap();
    stack.flush_pending();
    stack.undo(&mut store);
    stack.redo(&mut store);

    assert_eq!(
        *seen.borrow(),
        vec![
            (true, false, 1, 0),  // flush
            (false, true, 0, 1),  // undo
            (true, false, 1, 0),  // redo
        ]
    );
}
