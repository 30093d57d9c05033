//! The drag session engine.
//!
//! DESIGN
//! ======
//! [`EngineCore`] owns everything one engine instance shares between its
//! models: the node registry, the scroll-parent index and trackers, the
//! resize queue, the session, and the overlay. [`Engine`] is the cheap,
//! cloneable handle hosts hold; models and connected sensors only keep weak
//! links back to the core.
//!
//! Input transitions (`drag_start`, `move_pointer`, `drag_end`, `cancel`)
//! update state immediately but never do geometry work for pointer moves.
//! The host calls [`Engine::frame`] once per animation frame; a frame
//! applies the coalesced scroll batch, then queued resize re-measurements,
//! then at most one collision pass, and only when something changed since
//! the previous pass.
//!
//! Lifecycle events fire on the model's own listeners first, then on the
//! engine-level listeners. No `RefCell` borrow is held while listeners run.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dom::{Document, NodeId};
use crate::geometry::{Position, Rect};
use crate::model::{DragEvent, DragState, Draggable, DropEvent, DropState, Droppable, ModelCore, ModelHost};
use crate::modifier::{Modifier, ModifierRects, Pipeline};
use crate::overlay::Overlay;
use crate::rect::TrackedRect;
use crate::registry::{NodeRegistry, Owner};
use crate::resize::{ResizeObserver, ResizeTarget};
use crate::scroll::{ScrollBatch, ScrollParents, ScrollTracker};
use crate::sensor::{DragStartInput, DropInput, DropTargetInput, PointerInput, Sensor};
use crate::session::{Phase, Session};
use crate::signal::{Emitter, Handler, Runtime, Subscription};
use crate::strategy::{ClosestCenter, CollisionInput, IntersectionStrategy};

/// Identity of one engine instance, attached to its log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EngineId(Uuid);

impl EngineId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Engine-level lifecycle listeners. They run after the model's own.
struct Callbacks<T, U> {
    drag_start: Emitter<DragEvent<T>>,
    drag_end: Emitter<DragEvent<T>>,
    drag_cancel: Emitter<DragEvent<T>>,
    drop: Emitter<DropEvent<T, U>>,
    drop_enter: Emitter<DropEvent<T, U>>,
    drop_leave: Emitter<DropEvent<T, U>>,
}

impl<T, U> Default for Callbacks<T, U> {
    fn default() -> Self {
        Self {
            drag_start: Emitter::default(),
            drag_end: Emitter::default(),
            drag_cancel: Emitter::default(),
            drop: Emitter::default(),
            drop_enter: Emitter::default(),
            drop_leave: Emitter::default(),
        }
    }
}

// =============================================================================
// ENGINE CORE
// =============================================================================

/// Shared state of one engine instance.
pub(crate) struct EngineCore<T, U> {
    id: EngineId,
    document: Rc<dyn Document>,
    runtime: Runtime,
    registry: RefCell<NodeRegistry>,
    resize: RefCell<ResizeObserver>,
    scroll_parents: RefCell<ScrollParents>,
    scroll_tracker: RefCell<ScrollTracker>,
    scroll_batch: RefCell<ScrollBatch>,
    drags: RefCell<HashMap<String, Rc<DragState<T>>>>,
    /// Registration order is candidate order.
    drops: RefCell<Vec<Rc<DropState<T, U>>>>,
    session: Session,
    overlay: Overlay,
    strategy: Box<dyn IntersectionStrategy>,
    modifiers: Pipeline,
    callbacks: Callbacks<T, U>,
    collision_dirty: Cell<bool>,
    next_instance: Cell<u64>,
}

impl<T: Clone + 'static, U: Clone + 'static> EngineCore<T, U> {
    fn new(document: Rc<dyn Document>, strategy: Box<dyn IntersectionStrategy>, modifiers: Pipeline) -> Self {
        let runtime = Runtime::new();
        Self {
            id: EngineId::new(),
            document,
            session: Session::new(&runtime),
            overlay: Overlay::new(&runtime),
            runtime,
            registry: RefCell::new(NodeRegistry::new()),
            resize: RefCell::new(ResizeObserver::new()),
            scroll_parents: RefCell::new(ScrollParents::new()),
            scroll_tracker: RefCell::new(ScrollTracker::new()),
            scroll_batch: RefCell::new(ScrollBatch::new()),
            drags: RefCell::new(HashMap::new()),
            drops: RefCell::new(Vec::new()),
            strategy,
            modifiers,
            callbacks: Callbacks::default(),
            collision_dirty: Cell::new(false),
            next_instance: Cell::new(0),
        }
    }

    fn allocate_instance(&self) -> u64 {
        let instance = self.next_instance.get();
        self.next_instance.set(instance + 1);
        instance
    }

    fn host(self: &Rc<Self>) -> Weak<dyn ModelHost> {
        let weak: Weak<Self> = Rc::downgrade(self);
        weak
    }

    // --- Lookups ---

    fn drag_state(&self, id: &str) -> Option<Rc<DragState<T>>> {
        self.drags.borrow().get(id).cloned()
    }

    fn drop_state(&self, id: &str) -> Option<Rc<DropState<T, U>>> {
        self.drops.borrow().iter().find(|d| d.core.id() == id).cloned()
    }

    fn active_drag(&self) -> Option<Rc<DragState<T>>> {
        self.session.dragging().and_then(|id| self.drag_state(&id))
    }

    /// Enabled, with a node that is still registered to it and attached.
    fn is_usable(&self, core: &ModelCore) -> bool {
        core.is_enabled()
            && core
                .node
                .get()
                .is_some_and(|node| self.registry.borrow().is_valid(self.document.as_ref(), &core.owner, node))
    }

    fn measure(&self, core: &ModelCore) {
        match core.node.get().and_then(|node| self.document.measure(node)) {
            Some(bounds) => {
                core.rect.update(bounds);
            }
            None => {
                core.rect.clear();
            }
        }
    }

    // --- Models ---

    fn draggable(self: &Rc<Self>, id: &str, context: T) -> Draggable<T> {
        let previous = self.drag_state(id);
        let state = Rc::new(DragState::new(&self.runtime, id, self.allocate_instance(), context));
        let mut node = None;
        if let Some(old) = previous {
            node = old.core.node.get();
            state.core.active.set(old.core.active.get());
            self.retire(&old.core);
            old.release();
            debug!(engine = %self.id, drag = %id, "draggable replaced");
        }
        self.drags.borrow_mut().insert(id.to_string(), Rc::clone(&state));
        let handle = Draggable::new(state, self.host());
        handle.set_node(node);
        handle
    }

    fn droppable(self: &Rc<Self>, id: &str, context: U) -> Droppable<T, U> {
        let state = Rc::new(DropState::new(&self.runtime, id, self.allocate_instance(), context));
        let position = self.drops.borrow().iter().position(|d| d.core.id() == id);
        let mut node = None;
        if let Some(index) = position {
            let old = Rc::clone(&self.drops.borrow()[index]);
            node = old.core.node.get();
            state.core.active.set(old.core.active.get());
            self.retire(&old.core);
            old.release();
            self.drops.borrow_mut()[index] = Rc::clone(&state);
            debug!(engine = %self.id, drop = %id, "droppable replaced");
        } else {
            self.drops.borrow_mut().push(Rc::clone(&state));
        }
        let handle = Droppable::new(state, self.host());
        handle.set_node(node);
        handle
    }

    /// Detach a model from every shared index and mark it disposed.
    fn retire(&self, core: &ModelCore) {
        core.disposed.set(true);
        core.active.set(false);
        if let Some(node) = core.node.get() {
            self.registry.borrow_mut().unregister(&core.owner, node);
            self.resize.borrow_mut().unobserve(node, &ResizeTarget::Model(core.owner.clone()));
        }
        self.scroll_parents.borrow_mut().remove(&core.owner);
        self.collision_dirty.set(true);
    }

    // --- Transitions ---

    fn drag_start(&self, target: NodeId, pointer: Position) -> bool {
        if self.session.is_dragging() {
            trace!(engine = %self.id, ?target, "drag start ignored: already dragging");
            return false;
        }
        let found = self.registry.borrow().find_ancestor_drag_id(self.document.as_ref(), target);
        let Some(state) = found.and_then(|id| self.drag_state(&id)) else {
            trace!(engine = %self.id, ?target, "drag start ignored: no draggable");
            return false;
        };
        let id = state.core.id().to_string();
        if !self.is_usable(&state.core) {
            trace!(engine = %self.id, drag = %id, "drag start ignored: disabled or detached");
            return false;
        }
        let activated = state
            .activator
            .get()
            .is_none_or(|activator| self.document.is_inclusive_descendant(target, activator));
        if !activated {
            trace!(engine = %self.id, drag = %id, "drag start ignored: outside activator");
            return false;
        }
        let Some(node) = state.core.node.get() else {
            return false;
        };

        self.runtime.batch(|| {
            self.session.set_pointer(pointer);
            let containers: Vec<NodeId> = self.scroll_parents.borrow().all_containers().collect();
            self.scroll_tracker.borrow_mut().init(self.document.as_ref(), node, containers);
            self.scroll_batch.borrow_mut().discard();

            self.measure(&state.core);
            let drops = self.drops.borrow().clone();
            for drop in drops.iter().filter(|d| self.is_usable(&d.core)) {
                self.measure(&drop.core);
            }
            self.overlay.remeasure(self.document.as_ref());

            let dragging = state.core.rect.get();
            let overlay = self.overlay.rect();
            let rects = ModifierRects { dragging: dragging.as_ref(), dropping: None, overlay: overlay.as_ref() };
            self.overlay.set_position(self.modifiers.apply(pointer, &rects));

            state.core.active.set(true);
            self.session.set_dropping(None);
            self.session.set_dragging(Some(id.clone()));
        });
        self.collision_dirty.set(true);

        debug!(engine = %self.id, drag = %id, x = pointer.x, y = pointer.y, "drag started");
        let event = state.event();
        state.on_start.emit(&event);
        self.callbacks.drag_start.emit(&event);
        true
    }

    fn move_pointer(&self, pointer: Position) -> bool {
        if !self.session.is_dragging() {
            return false;
        }
        if self.session.set_pointer(pointer) {
            self.collision_dirty.set(true);
        }
        true
    }

    fn drag_end(&self, pointer: Position) -> bool {
        let Some(id) = self.session.dragging() else {
            trace!(engine = %self.id, "drag end ignored: idle");
            return false;
        };
        self.session.set_pointer(pointer);
        self.apply_scroll_batch();

        let drag_event = self.drag_state(&id).map(|state| {
            let event = state.event();
            state.on_end.emit(&event);
            event
        });
        let dropping = self.session.dropping();
        debug!(engine = %self.id, drag = %id, drop = ?dropping, "drag ended");
        if let Some(event) = drag_event {
            self.callbacks.drag_end.emit(&event);
            if let Some(drop) = dropping.and_then(|drop_id| self.drop_state(&drop_id)) {
                let drop_event = drop.event(event);
                drop.on_drop.emit(&drop_event);
                self.callbacks.drop.emit(&drop_event);
            }
        }
        self.finish();
        true
    }

    fn cancel(&self) -> bool {
        let Some(id) = self.session.dragging() else {
            return false;
        };
        let discarded = self.scroll_batch.borrow_mut().discard();
        debug!(engine = %self.id, drag = %id, discarded, "drag cancelled");
        if let Some(state) = self.drag_state(&id) {
            let event = state.event();
            state.on_cancel.emit(&event);
            self.callbacks.drag_cancel.emit(&event);
        }
        self.finish();
        true
    }

    /// Reset to idle without emitting anything.
    fn finish(&self) {
        self.runtime.batch(|| {
            if let Some(drag) = self.active_drag() {
                drag.core.active.set(false);
            }
            if let Some(drop) = self.session.dropping().and_then(|id| self.drop_state(&id)) {
                drop.core.active.set(false);
            }
            self.session.reset();
        });
        self.scroll_batch.borrow_mut().discard();
        self.scroll_tracker.borrow_mut().clear();
        self.collision_dirty.set(false);
    }

    fn enter_drop(&self, target: NodeId) -> bool {
        let Some(drag) = self.active_drag() else {
            return false;
        };
        let found = self.registry.borrow().find_ancestor_drop_id(self.document.as_ref(), target);
        let Some(drop) = found.and_then(|id| self.drop_state(&id)) else {
            return false;
        };
        if !self.is_usable(&drop.core) {
            return false;
        }
        self.switch_drop(&drag, Some(drop.core.id().to_string()));
        true
    }

    fn leave_drop(&self, target: NodeId) -> bool {
        let Some(drag) = self.active_drag() else {
            return false;
        };
        let found = self.registry.borrow().find_ancestor_drop_id(self.document.as_ref(), target);
        if found.is_none() || found != self.session.dropping() {
            return false;
        }
        self.switch_drop(&drag, None);
        true
    }

    fn drop_at(&self, target: Option<NodeId>) -> bool {
        if !self.session.is_dragging() {
            return false;
        }
        if let Some(target) = target {
            if !self.enter_drop(target) {
                if let Some(drag) = self.active_drag() {
                    trace!(engine = %self.id, ?target, "drop target unusable: clearing");
                    self.switch_drop(&drag, None);
                }
            }
        }
        self.drag_end(self.session.pointer())
    }

    /// Make `next` the active drop model. Leave fires before enter.
    fn switch_drop(&self, drag: &DragState<T>, next: Option<String>) {
        let current = self.session.dropping();
        if current == next {
            return;
        }
        let drag_event = drag.event();
        if let Some(previous) = current.and_then(|id| self.drop_state(&id)) {
            previous.core.active.set(false);
            let event = previous.event(drag_event.clone());
            debug!(engine = %self.id, drag = %event.drag.id, drop = %event.id, "drop leave");
            previous.on_leave.emit(&event);
            self.callbacks.drop_leave.emit(&event);
        }
        self.session.set_dropping(next.clone());
        if let Some(entered) = next.and_then(|id| self.drop_state(&id)) {
            entered.core.active.set(true);
            let event = entered.event(drag_event);
            debug!(engine = %self.id, drag = %event.drag.id, drop = %event.id, "drop enter");
            entered.on_enter.emit(&event);
            self.callbacks.drop_enter.emit(&event);
        }
    }

    // --- Geometry ---

    fn on_scroll(&self, container: NodeId) -> bool {
        if !self.session.is_dragging() {
            return false;
        }
        let Some(delta) = self.scroll_tracker.borrow_mut().record(self.document.as_ref(), container) else {
            return false;
        };
        trace!(engine = %self.id, ?container, dx = delta.dx, dy = delta.dy, "scroll queued");
        self.scroll_batch.borrow_mut().push(container, delta);
        true
    }

    fn notify_resize(&self, nodes: &[NodeId]) -> usize {
        self.resize.borrow_mut().notify(nodes)
    }

    fn set_overlay_node(&self, node: Option<NodeId>) {
        {
            let mut resize = self.resize.borrow_mut();
            if let Some(previous) = self.overlay.node() {
                resize.unobserve(previous, &ResizeTarget::Overlay);
            }
            if let Some(next) = node {
                resize.observe(next, ResizeTarget::Overlay);
            }
        }
        self.overlay.set_node(self.document.as_ref(), node);
        self.collision_dirty.set(true);
    }

    fn apply_scroll_batch(&self) {
        let pending = self.scroll_batch.borrow_mut().take();
        if pending.is_empty() {
            return;
        }
        let dragging = self.session.dragging();
        self.runtime.batch(|| {
            for (container, delta) in pending {
                let owners: Vec<Owner> = self.scroll_parents.borrow().affected(container).cloned().collect();
                for owner in owners {
                    let core_rect = match &owner {
                        Owner::Drag(id) if dragging.as_deref() == Some(id.as_str()) => {
                            self.drag_state(id).map(|s| s.core.rect.clone())
                        }
                        Owner::Drag(_) => None,
                        Owner::Drop(id) => self
                            .drop_state(id)
                            .filter(|s| self.is_usable(&s.core))
                            .map(|s| s.core.rect.clone()),
                    };
                    if let Some(rect) = core_rect {
                        rect.update_with_offset(delta.dx, delta.dy);
                    }
                }
                trace!(engine = %self.id, ?container, dx = delta.dx, dy = delta.dy, "scroll applied");
            }
        });
        self.collision_dirty.set(true);
    }

    fn apply_resizes(&self) {
        let pending = self.resize.borrow_mut().take_pending();
        if pending.is_empty() {
            return;
        }
        self.runtime.batch(|| {
            for (node, target) in pending {
                match target {
                    ResizeTarget::Overlay => self.overlay.remeasure(self.document.as_ref()),
                    ResizeTarget::Model(Owner::Drag(id)) => {
                        if let Some(state) = self.drag_state(&id).filter(|s| s.core.node.get() == Some(node)) {
                            self.measure(&state.core);
                        }
                    }
                    ResizeTarget::Model(Owner::Drop(id)) => {
                        if let Some(state) = self.drop_state(&id).filter(|s| s.core.node.get() == Some(node)) {
                            self.measure(&state.core);
                        }
                    }
                }
            }
        });
        self.collision_dirty.set(true);
    }

    fn frame(&self) -> bool {
        self.apply_scroll_batch();
        self.apply_resizes();
        if !self.session.is_dragging() {
            self.collision_dirty.set(false);
            return false;
        }
        if !self.collision_dirty.replace(false) {
            return false;
        }
        self.collide();
        true
    }

    /// One collision pass: rank candidates, move the overlay, switch the
    /// active drop model.
    fn collide(&self) {
        let Some(drag) = self.active_drag() else {
            return;
        };
        let drops = self.drops.borrow().clone();
        let candidates: Vec<Rect> =
            drops.iter().filter(|d| self.is_usable(&d.core)).filter_map(|d| d.core.rect.get()).collect();
        let dragging = drag.core.rect.get();
        let overlay = self.overlay.rect();
        let pointer = self.session.pointer();

        let ranked = self.strategy.rank(&CollisionInput {
            pointer,
            dragging: dragging.as_ref(),
            overlay: overlay.as_ref(),
            droppables: &candidates,
        });
        let next = ranked.into_iter().next().map(|collision| collision.rect);
        trace!(
            engine = %self.id,
            candidates = candidates.len(),
            next = ?next.as_ref().map(Rect::id),
            "collision pass"
        );

        let rects = ModifierRects { dragging: dragging.as_ref(), dropping: next.as_ref(), overlay: overlay.as_ref() };
        self.overlay.set_position(self.modifiers.apply(pointer, &rects));
        self.switch_drop(&drag, next.map(|rect| rect.id().to_string()));
    }
}

impl<T: Clone + 'static, U: Clone + 'static> ModelHost for EngineCore<T, U> {
    fn node_changed(&self, owner: &Owner, rect: &TrackedRect, previous: Option<NodeId>, next: Option<NodeId>) {
        let target = ResizeTarget::Model(owner.clone());
        if let Some(node) = previous {
            self.registry.borrow_mut().unregister(owner, node);
            self.resize.borrow_mut().unobserve(node, &target);
        }
        match next {
            Some(node) => {
                self.registry.borrow_mut().register(owner, node);
                self.resize.borrow_mut().observe(node, target);
                self.scroll_parents.borrow_mut().index(self.document.as_ref(), owner, node);
                match self.document.measure(node) {
                    Some(bounds) => {
                        rect.update(bounds);
                    }
                    None => {
                        rect.clear();
                    }
                }
            }
            None => {
                self.scroll_parents.borrow_mut().remove(owner);
                rect.clear();
            }
        }
        trace!(engine = %self.id, %owner, ?previous, ?next, "node changed");
        self.collision_dirty.set(true);
    }

    fn invalidate(&self) {
        self.collision_dirty.set(true);
    }

    fn dispose_model(&self, owner: &Owner, instance: u64) {
        match owner {
            Owner::Drag(id) => {
                let Some(state) = self.drag_state(id).filter(|s| s.core.instance == instance) else {
                    return;
                };
                if self.session.dragging().as_deref() == Some(id.as_str()) {
                    self.cancel();
                }
                self.retire(&state.core);
                self.drags.borrow_mut().remove(id);
            }
            Owner::Drop(id) => {
                let Some(state) = self.drop_state(id).filter(|s| s.core.instance == instance) else {
                    return;
                };
                if self.session.dropping().as_deref() == Some(id.as_str()) {
                    self.session.set_dropping(None);
                }
                self.retire(&state.core);
                self.drops.borrow_mut().retain(|d| !Rc::ptr_eq(d, &state));
            }
        }
        debug!(engine = %self.id, %owner, "model disposed");
    }
}

// =============================================================================
// ENGINE HANDLE
// =============================================================================

/// A drag-and-drop engine instance.
///
/// `T` is the draggable context type and `U` the droppable context type.
/// Cloning yields another handle to the same engine.
pub struct Engine<T, U> {
    core: Rc<EngineCore<T, U>>,
}

impl<T, U> Clone for Engine<T, U> {
    fn clone(&self) -> Self {
        Self { core: Rc::clone(&self.core) }
    }
}

impl<T: Clone + 'static, U: Clone + 'static> Engine<T, U> {
    /// An engine with the default strategy (closest center) and no modifiers.
    #[must_use]
    pub fn new(document: Rc<dyn Document>) -> Self {
        Self::builder(document).build()
    }

    #[must_use]
    pub fn builder(document: Rc<dyn Document>) -> EngineBuilder<T, U> {
        EngineBuilder::new(document)
    }

    #[must_use]
    pub fn id(&self) -> EngineId {
        self.core.id
    }

    // --- Models ---

    /// Register a draggable. An existing draggable with the same id is
    /// disposed first; its node and active flag move to the new one.
    pub fn draggable(&self, id: &str, context: T) -> Draggable<T> {
        self.core.draggable(id, context)
    }

    /// Register a droppable. An existing droppable with the same id is
    /// disposed first; its node and active flag move to the new one.
    pub fn droppable(&self, id: &str, context: U) -> Droppable<T, U> {
        self.core.droppable(id, context)
    }

    #[must_use]
    pub fn find_draggable(&self, id: &str) -> Option<Draggable<T>> {
        self.core.drag_state(id).map(|state| Draggable::new(state, self.core.host()))
    }

    #[must_use]
    pub fn find_droppable(&self, id: &str) -> Option<Droppable<T, U>> {
        self.core.drop_state(id).map(|state| Droppable::new(state, self.core.host()))
    }

    // --- Session ---

    /// The dragging model, if any.
    #[must_use]
    pub fn dragging(&self) -> Option<Draggable<T>> {
        self.core.active_drag().map(|state| Draggable::new(state, self.core.host()))
    }

    /// The active drop model, if any.
    #[must_use]
    pub fn dropping(&self) -> Option<Droppable<T, U>> {
        self.core
            .session
            .dropping()
            .and_then(|id| self.core.drop_state(&id))
            .map(|state| Droppable::new(state, self.core.host()))
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.core.session.is_dragging()
    }

    #[must_use]
    pub fn is_droppable(&self) -> bool {
        self.core.session.is_droppable()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.core.session.phase()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.core.session
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.core.overlay
    }

    /// Mount (`Some`) or unmount (`None`) the overlay node.
    pub fn set_overlay_node(&self, node: Option<NodeId>) {
        self.core.set_overlay_node(node);
    }

    // --- Engine-level listeners ---

    pub fn on_drag_start(&self, handler: impl Fn(&DragEvent<T>) + 'static) -> Subscription {
        self.core.callbacks.drag_start.subscribe(handler)
    }

    pub fn on_drag_end(&self, handler: impl Fn(&DragEvent<T>) + 'static) -> Subscription {
        self.core.callbacks.drag_end.subscribe(handler)
    }

    pub fn on_drag_cancel(&self, handler: impl Fn(&DragEvent<T>) + 'static) -> Subscription {
        self.core.callbacks.drag_cancel.subscribe(handler)
    }

    pub fn on_drop(&self, handler: impl Fn(&DropEvent<T, U>) + 'static) -> Subscription {
        self.core.callbacks.drop.subscribe(handler)
    }

    pub fn on_drop_enter(&self, handler: impl Fn(&DropEvent<T, U>) + 'static) -> Subscription {
        self.core.callbacks.drop_enter.subscribe(handler)
    }

    pub fn on_drop_leave(&self, handler: impl Fn(&DropEvent<T, U>) + 'static) -> Subscription {
        self.core.callbacks.drop_leave.subscribe(handler)
    }

    // --- Input ---

    /// Subscribe the engine to every event of `sensor`. The returned
    /// subscription disconnects it.
    pub fn connect(&self, sensor: &dyn Sensor) -> Subscription {
        let weak = Rc::downgrade(&self.core);

        let core = weak.clone();
        let start: Handler<DragStartInput> = Rc::new(move |input: &DragStartInput| {
            if let Some(core) = core.upgrade() {
                core.drag_start(input.target, input.pointer);
            }
        });
        let core = weak.clone();
        let moved: Handler<PointerInput> = Rc::new(move |input: &PointerInput| {
            if let Some(core) = core.upgrade() {
                core.move_pointer(input.pointer);
            }
        });
        let core = weak.clone();
        let end: Handler<PointerInput> = Rc::new(move |input: &PointerInput| {
            if let Some(core) = core.upgrade() {
                core.drag_end(input.pointer);
            }
        });
        let core = weak.clone();
        let cancel: Handler<()> = Rc::new(move |(): &()| {
            if let Some(core) = core.upgrade() {
                core.cancel();
            }
        });
        let core = weak.clone();
        let dropped: Handler<DropInput> = Rc::new(move |input: &DropInput| {
            if let Some(core) = core.upgrade() {
                core.drop_at(input.target);
            }
        });
        let core = weak.clone();
        let enter: Handler<DropTargetInput> = Rc::new(move |input: &DropTargetInput| {
            if let Some(core) = core.upgrade() {
                core.enter_drop(input.target);
            }
        });
        let core = weak;
        let leave: Handler<DropTargetInput> = Rc::new(move |input: &DropTargetInput| {
            if let Some(core) = core.upgrade() {
                core.leave_drop(input.target);
            }
        });

        Subscription::merge([
            sensor.on_drag_start(start),
            sensor.on_move_pointer(moved),
            sensor.on_drag_end(end),
            sensor.on_cancel(cancel),
            sensor.on_drop(dropped),
            sensor.on_drop_enter(enter),
            sensor.on_drop_leave(leave),
        ])
    }

    /// Start dragging the draggable registered at or above `target`.
    /// Returns `false` when nothing started.
    pub fn drag_start(&self, target: NodeId, pointer: Position) -> bool {
        self.core.drag_start(target, pointer)
    }

    /// Record a pointer move. Geometry work waits for the next frame.
    pub fn move_pointer(&self, pointer: Position) -> bool {
        self.core.move_pointer(pointer)
    }

    /// Commit the drag: flush scrolls, then fire end and (if targeting) drop.
    pub fn drag_end(&self, pointer: Position) -> bool {
        self.core.drag_end(pointer)
    }

    /// Abandon the drag. No-op when idle.
    pub fn cancel(&self) -> bool {
        self.core.cancel()
    }

    /// Make the droppable at or above `target` the active drop model.
    pub fn enter_drop(&self, target: NodeId) -> bool {
        self.core.enter_drop(target)
    }

    /// Clear the active drop model if `target` resolves to it.
    pub fn leave_drop(&self, target: NodeId) -> bool {
        self.core.leave_drop(target)
    }

    /// Optionally retarget to `target`, then end the drag. A `target` that
    /// does not resolve to an enabled, attached droppable clears the active
    /// drop (with a leave event), so the drag ends without a drop.
    pub fn drop_at(&self, target: Option<NodeId>) -> bool {
        self.core.drop_at(target)
    }

    // --- Host notifications ---

    /// A scroll event fired on `container`. Queues the offset change for the
    /// next frame; ignored while idle.
    pub fn on_scroll(&self, container: NodeId) -> bool {
        self.core.on_scroll(container)
    }

    /// The host's resize observer reported `nodes`. Returns how many were
    /// queued for re-measurement.
    pub fn notify_resize(&self, nodes: &[NodeId]) -> usize {
        self.core.notify_resize(nodes)
    }

    /// Run one animation frame. Returns whether a collision pass ran.
    pub fn frame(&self) -> bool {
        self.core.frame()
    }
}

impl<T, U> fmt::Debug for Engine<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.core.id)
            .field("dragging", &self.core.session.dragging())
            .field("dropping", &self.core.session.dropping())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

pub struct EngineBuilder<T, U> {
    document: Rc<dyn Document>,
    strategy: Box<dyn IntersectionStrategy>,
    modifiers: Pipeline,
    _context: PhantomData<fn() -> (T, U)>,
}

impl<T: Clone + 'static, U: Clone + 'static> EngineBuilder<T, U> {
    fn new(document: Rc<dyn Document>) -> Self {
        Self {
            document,
            strategy: Box::new(ClosestCenter),
            modifiers: Pipeline::new(),
            _context: PhantomData,
        }
    }

    /// Apply a configuration: its strategy replaces the current one and its
    /// overlay offset becomes the first modifier stage.
    #[must_use]
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.strategy = config.strategy.into_strategy();
        if let Some(offset) = config.overlay_offset {
            self.modifiers.prepend(offset);
        }
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: impl IntersectionStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Append a modifier stage.
    #[must_use]
    pub fn modifier(mut self, modifier: impl Modifier + 'static) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn build(self) -> Engine<T, U> {
        let core = EngineCore::new(self.document, self.strategy, self.modifiers);
        debug!(engine = %core.id, stages = core.modifiers.len(), "engine created");
        Engine { core: Rc::new(core) }
    }
}
