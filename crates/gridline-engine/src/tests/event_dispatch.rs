//! Event-bus dispatch semantics: ordering, snapshots, once, panic capture.

use std::cell::RefCell;
use std::rc::Rc;

use crate::events::{EventBus, EventKind, GridEvent};

fn refresh() -> GridEvent {
    GridEvent::DataChanged { affected: None }
}

#[test]
fn listeners_run_in_subscription_order() {
    let bus = EventBus::new();
    let order: Rc<RefCell<Vec<u8>>> = Rc::default();
    for i in 0..4u8 {
        let sink = Rc::clone(&order);
        bus.subscribe(EventKind::DataChanged, move |_| sink.borrow_mut().push(i));
    }
    bus.emit(&refresh());
    assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn unsubscribe_by_id() {
    let bus = EventBus::new();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let id = bus.subscribe(EventKind::DataChanged, move |_| *sink.borrow_mut() += 1);

    bus.emit(&refresh());
    assert!(bus.unsubscribe(EventKind::DataChanged, id));
    assert!(!bus.unsubscribe(EventKind::DataChanged, id));
    bus.emit(&refresh());
    assert_eq!(*count.borrow(), 1);
    assert_eq!(bus.listener_count(EventKind::DataChanged), 0);
}

#[test]
fn once_fires_exactly_once() {
    let bus = EventBus::new();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    bus.once(EventKind::DataChanged, move |_| *sink.borrow_mut() += 1);

    bus.emit(&refresh());
    bus.emit(&refresh());
    assert_eq!(*count.borrow(), 1);
    assert_eq!(bus.listener_count(EventKind::DataChanged), 0);
}

#[test]
fn once_reentrancy_cannot_double_fire() {
    // The once entry is removed before its listener runs, so a listener that
    // re-emits the same event does not recurse into itself.
    let bus = Rc::new(EventBus::new());
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let bus_inner = Rc::clone(&bus);
    bus.once(EventKind::DataChanged, move |_| {
        *sink.borrow_mut() += 1;
        bus_inner.emit(&GridEvent::DataChanged { affected: None });
    });
    bus.emit(&refresh());
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn panicking_listener_does_not_stop_dispatch() {
    let bus = EventBus::new();
    let reached = Rc::new(RefCell::new(false));

    bus.subscribe(EventKind::DataChanged, |_| {
        panic!("listener blew up");
    });
    let sink = Rc::clone(&reached);
    bus.subscribe(EventKind::DataChanged, move |_| {
        *sink.borrow_mut() = true;
    });

    // The emitter must not observe the panic either.
    bus.emit(&refresh());
    assert!(*reached.borrow());
}

#[test]
fn mid_dispatch_unsubscribe_keeps_the_snapshot() {
    let bus = Rc::new(EventBus::new());
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();

    // Listener A removes listener B while B is still in the snapshot:
    // B runs this round (snapshot semantics), not the next.
    let slot: Rc<RefCell<Option<crate::events::ListenerId>>> = Rc::default();

    let bus_inner = Rc::clone(&bus);
    let slot_inner = Rc::clone(&slot);
    let sink = Rc::clone(&order);
    bus.subscribe(EventKind::DataChanged, move |_| {
        sink.borrow_mut().push("a");
        if let Some(id) = *slot_inner.borrow() {
            bus_inner.unsubscribe(EventKind::DataChanged, id);
        }
    });
    let sink = Rc::clone(&order);
    let b_id = bus.subscribe(EventKind::DataChanged, move |_| {
        sink.borrow_mut().push("b");
    });
    *slot.borrow_mut() = Some(b_id);

    bus.emit(&refresh());
    bus.emit(&refresh());
    assert_eq!(*order.borrow(), vec!["a", "b", "a"]);
}

#[test]
fn mid_dispatch_subscribe_waits_for_the_next_emit() {
    let bus = Rc::new(EventBus::new());
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::default();

    let bus_inner = Rc::clone(&bus);
    let sink = Rc::clone(&order);
    bus.once(EventKind::DataChanged, move |_| {
        sink.borrow_mut().push("outer");
        let sink_inner = Rc::clone(&sink);
        bus_inner.subscribe(EventKind::DataChanged, move |_| {
            sink_inner.borrow_mut().push("late");
        });
    });

    bus.emit(&refresh());
    assert_eq!(*order.borrow(), vec!["outer"]);
    bus.emit(&refresh());
    assert_eq!(*order.borrow(), vec!["outer", "late"]);
}

#[test]
fn remove_all_clears_one_or_every_kind() {
    let bus = EventBus::new();
    bus.subscribe(EventKind::DataChanged, |_| {});
    bus.subscribe(EventKind::AfterSort, |_| {});
    bus.subscribe(EventKind::AfterSort, |_| {});

    bus.remove_all(Some(EventKind::AfterSort));
    assert_eq!(bus.listener_count(EventKind::AfterSort), 0);
    assert_eq!(bus.listener_count(EventKind::DataChanged), 1);

    bus.remove_all(None);
    assert_eq!(bus.listener_count(EventKind::DataChanged), 0);
}
