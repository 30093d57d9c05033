//! Draggable and droppable models.
//!
//! DESIGN
//! ======
//! A model is created by [`crate::Engine::draggable`] or
//! [`crate::Engine::droppable`] and identified by its string id within that
//! engine. The handle owns the model's observable cells and its lifecycle
//! listener sets; the engine owns everything shared (registry, scroll index,
//! resize observer) and is reached through a weak [`ModelHost`] link so a
//! handle outliving its engine degrades to a plain value holder.
//!
//! Node changes go through `set_node` only. Disposing releases every
//! listener first, then asks the engine to drop the model's shared state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dom::NodeId;
use crate::geometry::Rect;
use crate::rect::TrackedRect;
use crate::registry::Owner;
use crate::signal::{Emitter, Runtime, Signal, Subscription};

/// Payload delivered to drag lifecycle listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEvent<T> {
    pub id: String,
    pub context: T,
}

/// Payload delivered to drop lifecycle listeners: the dragged model's event
/// plus the drop model's own id and context.
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent<T, U> {
    pub drag: DragEvent<T>,
    pub id: String,
    pub context: U,
}

/// Engine-side callbacks a model handle needs.
pub(crate) trait ModelHost {
    /// `owner`'s node moved from `previous` to `next`; update the shared
    /// indexes and re-measure `rect`.
    fn node_changed(&self, owner: &Owner, rect: &TrackedRect, previous: Option<NodeId>, next: Option<NodeId>);

    /// Something affecting collision candidates changed.
    fn invalidate(&self);

    /// Drop the shared state of `owner` if `instance` is still the current
    /// registration.
    fn dispose_model(&self, owner: &Owner, instance: u64);
}

// =============================================================================
// SHARED MODEL STATE
// =============================================================================

pub(crate) struct ModelCore {
    pub(crate) owner: Owner,
    pub(crate) instance: u64,
    pub(crate) node: Signal<Option<NodeId>>,
    pub(crate) rect: TrackedRect,
    pub(crate) disabled: Signal<bool>,
    pub(crate) active: Signal<bool>,
    pub(crate) disposed: Cell<bool>,
}

impl ModelCore {
    fn new(runtime: &Runtime, owner: Owner, instance: u64) -> Self {
        let rect = TrackedRect::new(runtime, owner.id());
        Self {
            owner,
            instance,
            node: Signal::new(runtime, None),
            rect,
            disabled: Signal::new(runtime, false),
            active: Signal::new(runtime, false),
            disposed: Cell::new(false),
        }
    }

    pub(crate) fn id(&self) -> &str {
        self.owner.id()
    }

    pub(crate) fn is_enabled(&self) -> bool {
        !self.disposed.get() && !self.disabled.get()
    }

    fn set_node(&self, host: &Weak<dyn ModelHost>, next: Option<NodeId>) {
        if self.disposed.get() {
            return;
        }
        let previous = self.node.get();
        if previous == next {
            return;
        }
        self.node.set(next);
        if let Some(host) = host.upgrade() {
            host.node_changed(&self.owner, &self.rect, previous, next);
        }
    }

    fn set_disabled(&self, host: &Weak<dyn ModelHost>, disabled: bool) {
        if !self.disabled.set(disabled) {
            return;
        }
        if let Some(host) = host.upgrade() {
            host.invalidate();
        }
    }

    fn dispose(&self, host: &Weak<dyn ModelHost>) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(host) = host.upgrade() {
            host.dispose_model(&self.owner, self.instance);
        }
    }
}

impl fmt::Debug for ModelCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCore")
            .field("owner", &self.owner)
            .field("instance", &self.instance)
            .field("node", &self.node.get())
            .field("disabled", &self.disabled.get())
            .field("active", &self.active.get())
            .field("disposed", &self.disposed.get())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// DRAG MODEL
// =============================================================================

pub(crate) struct DragState<T> {
    pub(crate) core: ModelCore,
    pub(crate) context: RefCell<T>,
    pub(crate) activator: Signal<Option<NodeId>>,
    pub(crate) on_start: Emitter<DragEvent<T>>,
    pub(crate) on_end: Emitter<DragEvent<T>>,
    pub(crate) on_cancel: Emitter<DragEvent<T>>,
}

impl<T: Clone + 'static> DragState<T> {
    pub(crate) fn new(runtime: &Runtime, id: &str, instance: u64, context: T) -> Self {
        Self {
            core: ModelCore::new(runtime, Owner::Drag(id.to_string()), instance),
            context: RefCell::new(context),
            activator: Signal::new(runtime, None),
            on_start: Emitter::new(),
            on_end: Emitter::new(),
            on_cancel: Emitter::new(),
        }
    }

    pub(crate) fn event(&self) -> DragEvent<T> {
        DragEvent { id: self.core.id().to_string(), context: self.context.borrow().clone() }
    }

    pub(crate) fn release(&self) {
        self.on_start.clear();
        self.on_end.clear();
        self.on_cancel.clear();
    }
}

/// Handle to a registered draggable.
///
/// Clones share the same model.
pub struct Draggable<T> {
    pub(crate) state: Rc<DragState<T>>,
    host: Weak<dyn ModelHost>,
}

impl<T> Clone for Draggable<T> {
    fn clone(&self) -> Self {
        Self { state: Rc::clone(&self.state), host: self.host.clone() }
    }
}

impl<T: Clone + 'static> Draggable<T> {
    pub(crate) fn new(state: Rc<DragState<T>>, host: Weak<dyn ModelHost>) -> Self {
        Self { state, host }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.state.core.id()
    }

    #[must_use]
    pub fn context(&self) -> T {
        self.state.context.borrow().clone()
    }

    pub fn set_context(&self, context: T) {
        *self.state.context.borrow_mut() = context;
    }

    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.state.core.node.get()
    }

    /// Set (`Some`) or clear (`None`) the host node. Ignored after dispose.
    pub fn set_node(&self, node: Option<NodeId>) {
        self.state.core.set_node(&self.host, node);
    }

    #[must_use]
    pub fn activator_node(&self) -> Option<NodeId> {
        self.state.activator.get()
    }

    /// Restrict drag start to events targeting `node` or its descendants.
    pub fn set_activator_node(&self, node: Option<NodeId>) {
        if !self.state.core.disposed.get() {
            self.state.activator.set(node);
        }
    }

    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.state.core.rect.get()
    }

    pub fn subscribe_rect(&self, handler: impl Fn(&Option<Rect>) + 'static) -> Subscription {
        self.state.core.rect.subscribe(handler)
    }

    #[must_use]
    pub fn disabled(&self) -> bool {
        self.state.core.disabled.get()
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.state.core.set_disabled(&self.host, disabled);
    }

    /// Whether this model is the session's dragging model.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.core.active.get()
    }

    pub fn subscribe_active(&self, handler: impl Fn(&bool) + 'static) -> Subscription {
        self.state.core.active.subscribe(handler)
    }

    pub fn on_drag_start(&self, handler: impl Fn(&DragEvent<T>) + 'static) -> Subscription {
        self.state.on_start.subscribe(handler)
    }

    pub fn on_drag_end(&self, handler: impl Fn(&DragEvent<T>) + 'static) -> Subscription {
        self.state.on_end.subscribe(handler)
    }

    pub fn on_drag_cancel(&self, handler: impl Fn(&DragEvent<T>) + 'static) -> Subscription {
        self.state.on_cancel.subscribe(handler)
    }

    /// Release listeners and unregister. Disposing the dragging model
    /// cancels the session.
    pub fn dispose(&self) {
        if self.state.core.disposed.get() {
            return;
        }
        self.state.release();
        self.state.core.dispose(&self.host);
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.core.disposed.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Draggable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draggable")
            .field("core", &self.state.core)
            .field("context", &*self.state.context.borrow())
            .finish()
    }
}

// =============================================================================
// DROP MODEL
// =============================================================================

pub(crate) struct DropState<T, U> {
    pub(crate) core: ModelCore,
    pub(crate) context: RefCell<U>,
    pub(crate) on_drop: Emitter<DropEvent<T, U>>,
    pub(crate) on_enter: Emitter<DropEvent<T, U>>,
    pub(crate) on_leave: Emitter<DropEvent<T, U>>,
}

impl<T: Clone + 'static, U: Clone + 'static> DropState<T, U> {
    pub(crate) fn new(runtime: &Runtime, id: &str, instance: u64, context: U) -> Self {
        Self {
            core: ModelCore::new(runtime, Owner::Drop(id.to_string()), instance),
            context: RefCell::new(context),
            on_drop: Emitter::new(),
            on_enter: Emitter::new(),
            on_leave: Emitter::new(),
        }
    }

    pub(crate) fn event(&self, drag: DragEvent<T>) -> DropEvent<T, U> {
        DropEvent { drag, id: self.core.id().to_string(), context: self.context.borrow().clone() }
    }

    pub(crate) fn release(&self) {
        self.on_drop.clear();
        self.on_enter.clear();
        self.on_leave.clear();
    }
}

/// Handle to a registered droppable.
///
/// Clones share the same model.
pub struct Droppable<T, U> {
    pub(crate) state: Rc<DropState<T, U>>,
    host: Weak<dyn ModelHost>,
}

impl<T, U> Clone for Droppable<T, U> {
    fn clone(&self) -> Self {
        Self { state: Rc::clone(&self.state), host: self.host.clone() }
    }
}

impl<T: Clone + 'static, U: Clone + 'static> Droppable<T, U> {
    pub(crate) fn new(state: Rc<DropState<T, U>>, host: Weak<dyn ModelHost>) -> Self {
        Self { state, host }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.state.core.id()
    }

    #[must_use]
    pub fn context(&self) -> U {
        self.state.context.borrow().clone()
    }

    pub fn set_context(&self, context: U) {
        *self.state.context.borrow_mut() = context;
    }

    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.state.core.node.get()
    }

    /// Set (`Some`) or clear (`None`) the host node. Ignored after dispose.
    pub fn set_node(&self, node: Option<NodeId>) {
        self.state.core.set_node(&self.host, node);
    }

    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.state.core.rect.get()
    }

    pub fn subscribe_rect(&self, handler: impl Fn(&Option<Rect>) + 'static) -> Subscription {
        self.state.core.rect.subscribe(handler)
    }

    #[must_use]
    pub fn disabled(&self) -> bool {
        self.state.core.disabled.get()
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.state.core.set_disabled(&self.host, disabled);
    }

    /// Whether this model is the session's current drop target.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.core.active.get()
    }

    pub fn subscribe_active(&self, handler: impl Fn(&bool) + 'static) -> Subscription {
        self.state.core.active.subscribe(handler)
    }

    pub fn on_drop(&self, handler: impl Fn(&DropEvent<T, U>) + 'static) -> Subscription {
        self.state.on_drop.subscribe(handler)
    }

    pub fn on_drop_enter(&self, handler: impl Fn(&DropEvent<T, U>) + 'static) -> Subscription {
        self.state.on_enter.subscribe(handler)
    }

    pub fn on_drop_leave(&self, handler: impl Fn(&DropEvent<T, U>) + 'static) -> Subscription {
        self.state.on_leave.subscribe(handler)
    }

    /// Release listeners and unregister. Disposing the current drop target
    /// clears it without a leave event.
    pub fn dispose(&self) {
        if self.state.core.disposed.get() {
            return;
        }
        self.state.release();
        self.state.core.dispose(&self.host);
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.core.disposed.get()
    }
}

impl<T, U: fmt::Debug> fmt::Debug for Droppable<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Droppable")
            .field("core", &self.state.core)
            .field("context", &*self.state.context.borrow())
            .finish()
    }
}
