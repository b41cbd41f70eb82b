//! Typed pub/sub bus used by every engine component.
//!
//! Listeners are registered per [`EventKind`] and receive the full
//! [`GridEvent`] payload. Dispatch iterates a snapshot taken at emit time, so
//! a listener may subscribe or unsubscribe mid-dispatch without invalidating
//! iteration. A panicking listener is caught and logged with the event name;
//! the remaining listeners still run and the emitter never observes the
//! failure. Within one `emit`, listeners run in subscription order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use gridline_common::{CellRange, GridError};

use crate::sort::SortModel;

pub type ListenerId = u64;

/// Which axis a size change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    Row,
    Column,
}

/// Shared cancellation flag carried by [`GridEvent::BeforeSort`].
///
/// Any listener may call [`CancelToken::cancel`] before returning; the sort
/// is then skipped and no `AfterSort` follows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Every announcement the engine makes, with its payload.
#[derive(Debug, Clone)]
pub enum GridEvent {
    /// Data mutated. `affected` is `None` for a full invalidation.
    DataChanged { affected: Option<CellRange> },
    /// About to sort; cancellable.
    BeforeSort {
        model: SortModel,
        cancel: CancelToken,
    },
    /// The sort model changed and a permutation was computed.
    SortChanged {
        model: SortModel,
        changed_column: Option<String>,
        permutation: Vec<u32>,
    },
    /// The sort model was reset to empty.
    SortCleared { previous: SortModel },
    /// A permutation is in effect; renderers re-read visual positions.
    AfterSort { permutation: Vec<u32> },
    /// The filter set changed.
    FilterChanged { filtered_count: usize },
    GroupAdded { group_id: String },
    GroupRemoved { group_id: String },
    GroupUpdated { group_id: String },
    GroupToggled { group_id: String, expanded: bool },
    HierarchyChanged { affected_group_ids: Vec<String> },
    AxisResized {
        axis: AxisKind,
        index: u32,
        new_size: f64,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
        undo_count: usize,
        redo_count: usize,
    },
    /// A reportable failure, e.g. a rejected backend sort. `context` carries
    /// the sort model the failure relates to, when there is one.
    Error {
        error: GridError,
        context: Option<SortModel>,
    },
}

/// Compact discriminant used to index listener lists.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DataChanged = 0,
    BeforeSort,
    SortChanged,
    SortCleared,
    AfterSort,
    FilterChanged,
    GroupAdded,
    GroupRemoved,
    GroupUpdated,
    GroupToggled,
    HierarchyChanged,
    AxisResized,
    HistoryChanged,
    Error,
}

const EVENT_KIND_COUNT: usize = 14;

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::DataChanged => "dataChanged",
            EventKind::BeforeSort => "beforeSort",
            EventKind::SortChanged => "sortChanged",
            EventKind::SortCleared => "sortCleared",
            EventKind::AfterSort => "afterSort",
            EventKind::FilterChanged => "filterChanged",
            EventKind::GroupAdded => "groupAdded",
            EventKind::GroupRemoved => "groupRemoved",
            EventKind::GroupUpdated => "groupUpdated",
            EventKind::GroupToggled => "groupToggled",
            EventKind::HierarchyChanged => "hierarchyChanged",
            EventKind::AxisResized => "axisResized",
            EventKind::HistoryChanged => "historyChanged",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl GridEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GridEvent::DataChanged { .. } => EventKind::DataChanged,
            GridEvent::BeforeSort { .. } => EventKind::BeforeSort,
            GridEvent::SortChanged { .. } => EventKind::SortChanged,
            GridEvent::SortCleared { .. } => EventKind::SortCleared,
            GridEvent::AfterSort { .. } => EventKind::AfterSort,
            GridEvent::FilterChanged { .. } => EventKind::FilterChanged,
            GridEvent::GroupAdded { .. } => EventKind::GroupAdded,
            GridEvent::GroupRemoved { .. } => EventKind::GroupRemoved,
            GridEvent::GroupUpdated { .. } => EventKind::GroupUpdated,
            GridEvent::GroupToggled { .. } => EventKind::GroupToggled,
            GridEvent::HierarchyChanged { .. } => EventKind::HierarchyChanged,
            GridEvent::AxisResized { .. } => EventKind::AxisResized,
            GridEvent::HistoryChanged { .. } => EventKind::HistoryChanged,
            GridEvent::Error { .. } => EventKind::Error,
        }
    }
}

type ListenerFn = Rc<RefCell<dyn FnMut(&GridEvent)>>;

struct Entry {
    id: ListenerId,
    once: bool,
    callback: ListenerFn,
}

/// The bus itself. Interior-mutable so listeners holding an `Rc<EventBus>`
/// can re-enter `subscribe`/`unsubscribe` during dispatch.
pub struct EventBus {
    slots: RefCell<[Vec<Entry>; EVENT_KIND_COUNT]>,
    next_id: Cell<ListenerId>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(std::array::from_fn(|_| Vec::new())),
            next_id: Cell::new(1),
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GridEvent) + 'static,
    {
        self.push_entry(kind, listener, false)
    }

    /// Subscribe for a single delivery; the entry is removed before the
    /// listener runs, so re-emitting from inside it cannot double-fire.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GridEvent) + 'static,
    {
        self.push_entry(kind, listener, true)
    }

    fn push_entry<F>(&self, kind: EventKind, listener: F, once: bool) -> ListenerId
    where
        F: FnMut(&GridEvent) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.slots.borrow_mut()[kind as usize].push(Entry {
            id,
            once,
            callback: Rc::new(RefCell::new(listener)),
        });
        id
    }

    pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut slots = self.slots.borrow_mut();
        let slot = &mut slots[kind as usize];
        let before = slot.len();
        slot.retain(|entry| entry.id != id);
        slot.len() != before
    }

    /// Drop all listeners for one kind, or for every kind when `None`.
    pub fn remove_all(&self, kind: Option<EventKind>) {
        let mut slots = self.slots.borrow_mut();
        match kind {
            Some(kind) => slots[kind as usize].clear(),
            None => {
                for slot in slots.iter_mut() {
                    slot.clear();
                }
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.slots.borrow()[kind as usize].len()
    }

    /// Dispatch to every listener subscribed at the time of the call.
    ///
    /// Listener panics are caught and logged; dispatch continues.
    pub fn emit(&self, event: &GridEvent) {
        let kind = event.kind();
        let snapshot: Vec<(ListenerId, bool, ListenerFn)> = {
            let slots = self.slots.borrow();
            slots[kind as usize]
                .iter()
                .map(|entry| (entry.id, entry.once, Rc::clone(&entry.callback)))
                .collect()
        };

        for (id, once, callback) in snapshot {
            if once {
                self.unsubscribe(kind, id);
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (callback.borrow_mut())(event);
            }));
            if outcome.is_err() {
                tracing::warn!(event = kind.name(), listener = id, "grid event listener panicked");
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        let total: usize = slots.iter().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("listeners", &total)
            .finish()
    }
}
