//! Sensors: input sources that drive a drag session.
//!
//! A [`Sensor`] turns whatever raw input it owns into seven lifecycle
//! events. The engine subscribes to each one and never learns which device
//! produced an event, so pointer, touch, and keyboard sources can all drive
//! the same session. [`CompositeSensor`] fans subscriptions out to N sensors
//! and returns one combined cleanup.
//!
//! [`ManualSensor`] exposes every event as a host-callable method.
//! [`PointerSensor`] is the default adapter: primary-button down/move/up
//! plus the `Escape` key.

#[cfg(test)]
#[path = "sensor_test.rs"]
mod sensor_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::consts::CANCEL_KEY;
use crate::dom::NodeId;
use crate::geometry::Position;
use crate::signal::{Emitter, Handler, Subscription};

// =============================================================================
// EVENT PAYLOADS
// =============================================================================

/// A drag was requested on `target` with the pointer at `pointer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStartInput {
    pub target: NodeId,
    pub pointer: Position,
}

/// The pointer moved, or the drag ended, at `pointer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer: Position,
}

/// A sensor-resolved drop target (enter/leave).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTargetInput {
    pub target: NodeId,
}

/// The sensor committed the drag, optionally naming where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropInput {
    pub target: Option<NodeId>,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

// =============================================================================
// SENSOR CONTRACT
// =============================================================================

/// An input source. Each method registers a handler and returns its cleanup.
pub trait Sensor {
    fn on_drag_start(&self, handler: Handler<DragStartInput>) -> Subscription;
    fn on_drag_end(&self, handler: Handler<PointerInput>) -> Subscription;
    fn on_move_pointer(&self, handler: Handler<PointerInput>) -> Subscription;
    fn on_cancel(&self, handler: Handler<()>) -> Subscription;
    fn on_drop(&self, handler: Handler<DropInput>) -> Subscription;
    fn on_drop_enter(&self, handler: Handler<DropTargetInput>) -> Subscription;
    fn on_drop_leave(&self, handler: Handler<DropTargetInput>) -> Subscription;
}

/// Several sensors acting as one.
#[derive(Default)]
pub struct CompositeSensor {
    sensors: Vec<Box<dyn Sensor>>,
}

impl CompositeSensor {
    #[must_use]
    pub fn new(sensors: Vec<Box<dyn Sensor>>) -> Self {
        Self { sensors }
    }

    pub fn push(&mut self, sensor: impl Sensor + 'static) {
        self.sensors.push(Box::new(sensor));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    fn fan_out<E>(&self, handler: &Handler<E>, subscribe: impl Fn(&dyn Sensor, Handler<E>) -> Subscription) -> Subscription {
        Subscription::merge(self.sensors.iter().map(|sensor| subscribe(sensor.as_ref(), Rc::clone(handler))))
    }
}

/// Compose `sensors` into one.
#[must_use]
pub fn compose(sensors: Vec<Box<dyn Sensor>>) -> CompositeSensor {
    CompositeSensor::new(sensors)
}

impl Sensor for CompositeSensor {
    fn on_drag_start(&self, handler: Handler<DragStartInput>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_drag_start(h))
    }

    fn on_drag_end(&self, handler: Handler<PointerInput>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_drag_end(h))
    }

    fn on_move_pointer(&self, handler: Handler<PointerInput>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_move_pointer(h))
    }

    fn on_cancel(&self, handler: Handler<()>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_cancel(h))
    }

    fn on_drop(&self, handler: Handler<DropInput>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_drop(h))
    }

    fn on_drop_enter(&self, handler: Handler<DropTargetInput>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_drop_enter(h))
    }

    fn on_drop_leave(&self, handler: Handler<DropTargetInput>) -> Subscription {
        self.fan_out(&handler, |s, h| s.on_drop_leave(h))
    }
}

// =============================================================================
// MANUAL SENSOR
// =============================================================================

/// A sensor whose events are raised directly by the host.
///
/// Cloning yields another handle to the same listener sets, so one clone can
/// be handed to the engine while the host keeps the other to feed events.
#[derive(Clone, Default)]
pub struct ManualSensor {
    drag_start: Emitter<DragStartInput>,
    drag_end: Emitter<PointerInput>,
    move_pointer: Emitter<PointerInput>,
    cancel: Emitter<()>,
    drop: Emitter<DropInput>,
    drop_enter: Emitter<DropTargetInput>,
    drop_leave: Emitter<DropTargetInput>,
}

impl ManualSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_start(&self, target: NodeId, pointer: Position) {
        self.drag_start.emit(&DragStartInput { target, pointer });
    }

    pub fn move_pointer(&self, pointer: Position) {
        self.move_pointer.emit(&PointerInput { pointer });
    }

    pub fn drag_end(&self, pointer: Position) {
        self.drag_end.emit(&PointerInput { pointer });
    }

    pub fn cancel(&self) {
        self.cancel.emit(&());
    }

    pub fn drop_at(&self, target: Option<NodeId>) {
        self.drop.emit(&DropInput { target });
    }

    pub fn drop_enter(&self, target: NodeId) {
        self.drop_enter.emit(&DropTargetInput { target });
    }

    pub fn drop_leave(&self, target: NodeId) {
        self.drop_leave.emit(&DropTargetInput { target });
    }
}

impl Sensor for ManualSensor {
    fn on_drag_start(&self, handler: Handler<DragStartInput>) -> Subscription {
        self.drag_start.subscribe_shared(handler)
    }

    fn on_drag_end(&self, handler: Handler<PointerInput>) -> Subscription {
        self.drag_end.subscribe_shared(handler)
    }

    fn on_move_pointer(&self, handler: Handler<PointerInput>) -> Subscription {
        self.move_pointer.subscribe_shared(handler)
    }

    fn on_cancel(&self, handler: Handler<()>) -> Subscription {
        self.cancel.subscribe_shared(handler)
    }

    fn on_drop(&self, handler: Handler<DropInput>) -> Subscription {
        self.drop.subscribe_shared(handler)
    }

    fn on_drop_enter(&self, handler: Handler<DropTargetInput>) -> Subscription {
        self.drop_enter.subscribe_shared(handler)
    }

    fn on_drop_leave(&self, handler: Handler<DropTargetInput>) -> Subscription {
        self.drop_leave.subscribe_shared(handler)
    }
}

// =============================================================================
// POINTER SENSOR
// =============================================================================

/// Default pointer adapter.
///
/// Only the primary button starts a drag; moves and releases are forwarded
/// while that press is held. `Escape` cancels a held press.
#[derive(Clone, Default)]
pub struct PointerSensor {
    events: ManualSensor,
    pressed: Rc<Cell<bool>>,
}

impl PointerSensor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed.get()
    }

    pub fn pointer_down(&self, target: NodeId, pointer: Position, button: Button) {
        if button != Button::Primary || self.pressed.get() {
            return;
        }
        self.pressed.set(true);
        self.events.drag_start(target, pointer);
    }

    pub fn pointer_move(&self, pointer: Position) {
        if self.pressed.get() {
            self.events.move_pointer(pointer);
        }
    }

    pub fn pointer_up(&self, pointer: Position, button: Button) {
        if button != Button::Primary || !self.pressed.get() {
            return;
        }
        self.pressed.set(false);
        self.events.drag_end(pointer);
    }

    pub fn key_down(&self, key: &Key) {
        if key.0 == CANCEL_KEY && self.pressed.get() {
            self.pressed.set(false);
            self.events.cancel();
        }
    }
}

impl Sensor for PointerSensor {
    fn on_drag_start(&self, handler: Handler<DragStartInput>) -> Subscription {
        self.events.on_drag_start(handler)
    }

    fn on_drag_end(&self, handler: Handler<PointerInput>) -> Subscription {
        self.events.on_drag_end(handler)
    }

    fn on_move_pointer(&self, handler: Handler<PointerInput>) -> Subscription {
        self.events.on_move_pointer(handler)
    }

    fn on_cancel(&self, handler: Handler<()>) -> Subscription {
        self.events.on_cancel(handler)
    }

    fn on_drop(&self, handler: Handler<DropInput>) -> Subscription {
        self.events.on_drop(handler)
    }

    fn on_drop_enter(&self, handler: Handler<DropTargetInput>) -> Subscription {
        self.events.on_drop_enter(handler)
    }

    fn on_drop_leave(&self, handler: Handler<DropTargetInput>) -> Subscription {
        self.events.on_drop_leave(handler)
    }
}
