//! Observable per-engine session state.
//!
//! Holds ids rather than model references: the engine resolves the id to
//! the current registration, so a model re-registered mid-drag keeps the
//! session.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use serde::Serialize;

use crate::geometry::Position;
use crate::signal::{Runtime, Signal, Subscription};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Dragging,
    /// Dragging with a drop model active.
    Targeting,
}

#[derive(Debug, Clone)]
pub struct Session {
    dragging: Signal<Option<String>>,
    dropping: Signal<Option<String>>,
    pointer: Signal<Position>,
    /// Derived from `dragging`; only notifies when the flag flips.
    is_dragging: Signal<bool>,
    /// Derived from `dropping`; only notifies when the flag flips.
    is_droppable: Signal<bool>,
}

impl Session {
    #[must_use]
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            dragging: Signal::new(runtime, None),
            dropping: Signal::new(runtime, None),
            pointer: Signal::new(runtime, Position::default()),
            is_dragging: Signal::new(runtime, false),
            is_droppable: Signal::new(runtime, false),
        }
    }

    /// Id of the dragging model.
    #[must_use]
    pub fn dragging(&self) -> Option<String> {
        self.dragging.get()
    }

    /// Id of the active drop model.
    #[must_use]
    pub fn dropping(&self) -> Option<String> {
        self.dropping.get()
    }

    #[must_use]
    pub fn pointer(&self) -> Position {
        self.pointer.get()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging.with(Option::is_some)
    }

    #[must_use]
    pub fn is_droppable(&self) -> bool {
        self.dropping.with(Option::is_some)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match (self.is_dragging(), self.is_droppable()) {
            (false, _) => Phase::Idle,
            (true, false) => Phase::Dragging,
            (true, true) => Phase::Targeting,
        }
    }

    pub fn subscribe_dragging(&self, handler: impl Fn(&Option<String>) + 'static) -> Subscription {
        self.dragging.subscribe(handler)
    }

    pub fn subscribe_dropping(&self, handler: impl Fn(&Option<String>) + 'static) -> Subscription {
        self.dropping.subscribe(handler)
    }

    /// Fires when a drag starts or ends, not on every id change.
    pub fn subscribe_is_dragging(&self, handler: impl Fn(&bool) + 'static) -> Subscription {
        self.is_dragging.subscribe(handler)
    }

    /// Fires when targeting starts or stops, not when one drop replaces
    /// another.
    pub fn subscribe_is_droppable(&self, handler: impl Fn(&bool) + 'static) -> Subscription {
        self.is_droppable.subscribe(handler)
    }

    pub fn subscribe_pointer(&self, handler: impl Fn(&Position) + 'static) -> Subscription {
        self.pointer.subscribe(handler)
    }

    pub(crate) fn set_dragging(&self, id: Option<String>) -> bool {
        let flag = id.is_some();
        let changed = self.dragging.set(id);
        self.is_dragging.set(flag);
        changed
    }

    pub(crate) fn set_dropping(&self, id: Option<String>) -> bool {
        let flag = id.is_some();
        let changed = self.dropping.set(id);
        self.is_droppable.set(flag);
        changed
    }

    pub(crate) fn set_pointer(&self, pointer: Position) -> bool {
        self.pointer.set(pointer)
    }

    /// Back to idle.
    pub(crate) fn reset(&self) {
        self.set_dropping(None);
        self.set_dragging(None);
    }
}
