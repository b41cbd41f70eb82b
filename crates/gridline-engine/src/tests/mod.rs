mod event_dispatch;
mod facade_flow;
mod undo_history;
