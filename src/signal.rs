//! Single-threaded reactive primitives.
//!
//! DESIGN
//! ======
//! The engine needs three things from a reactive runtime: cells whose writes
//! are observable ([`Signal`]), listener sets with explicit cleanup
//! ([`Emitter`] / [`Subscription`]), and a batched action wrapper
//! ([`Runtime::batch`]) so that observers of a multi-field transition only
//! ever see the finished state. Everything runs on the UI thread; shared
//! state is `Rc` + `RefCell`, and no borrow is held while user callbacks run.

#[cfg(test)]
#[path = "signal_test.rs"]
mod signal_test;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A shared callback receiving events of type `E`.
pub type Handler<E> = Rc<dyn Fn(&E)>;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Cleanup handle returned by every subscribe call.
///
/// Dropping a `Subscription` keeps the listener registered; call
/// [`Subscription::unsubscribe`] to release it.
#[must_use = "call `unsubscribe` to release the listener"]
pub struct Subscription {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap an arbitrary cleanup closure.
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self { cleanup: Some(Box::new(cleanup)) }
    }

    /// A subscription with nothing to clean up.
    pub fn noop() -> Self {
        Self { cleanup: None }
    }

    /// Combine several cleanups into one that runs them all in order.
    pub fn merge(subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        let all: Vec<Subscription> = subscriptions.into_iter().collect();
        Self::new(move || {
            for subscription in all {
                subscription.unsubscribe();
            }
        })
    }

    /// Release the listener(s) this subscription guards.
    pub fn unsubscribe(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cleanup.is_some()).finish()
    }
}

// =============================================================================
// EMITTER
// =============================================================================

struct Slots<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
}

/// An ordered listener registry.
///
/// Cloning an `Emitter` yields another handle to the same listener set.
pub struct Emitter<E> {
    slots: Rc<RefCell<Slots<E>>>,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self { slots: Rc::clone(&self.slots) }
    }
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self { slots: Rc::new(RefCell::new(Slots { next_id: 0, handlers: Vec::new() })) }
    }
}

impl<E: 'static> Emitter<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; it runs after every listener registered before it.
    pub fn subscribe(&self, handler: impl Fn(&E) + 'static) -> Subscription {
        self.subscribe_shared(Rc::new(handler))
    }

    /// Register an already shared handler (used when one handler is fanned
    /// out to several emitters).
    pub fn subscribe_shared(&self, handler: Handler<E>) -> Subscription {
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.handlers.push((id, handler));
            id
        };
        let weak: Weak<RefCell<Slots<E>>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.borrow_mut().handlers.retain(|(slot, _)| *slot != id);
            }
        })
    }

    /// Call every listener with `event`.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while being called.
    pub fn emit(&self, event: &E) {
        let handlers: Vec<Handler<E>> = self.slots.borrow().handlers.iter().map(|(_, h)| Rc::clone(h)).collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.slots.borrow_mut().handlers.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

type Job = Box<dyn FnOnce()>;

#[derive(Default)]
struct RuntimeInner {
    depth: Cell<usize>,
    pending: RefCell<Vec<Job>>,
}

/// Batching scheduler shared by every signal of one engine.
#[derive(Clone, Default)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` with signal notifications deferred until the outermost
    /// batch returns.
    pub fn batch<R>(&self, action: impl FnOnce() -> R) -> R {
        self.inner.depth.set(self.inner.depth.get() + 1);
        let result = action();
        let depth = self.inner.depth.get() - 1;
        self.inner.depth.set(depth);
        if depth == 0 {
            self.flush();
        }
        result
    }

    /// Whether a batch is currently open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.inner.depth.get() > 0
    }

    fn schedule(&self, job: Job) {
        if self.is_batching() {
            self.inner.pending.borrow_mut().push(job);
        } else {
            job();
        }
    }

    fn flush(&self) {
        loop {
            let jobs = std::mem::take(&mut *self.inner.pending.borrow_mut());
            if jobs.is_empty() {
                break;
            }
            for job in jobs {
                job();
            }
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("depth", &self.inner.depth.get())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}

// =============================================================================
// SIGNAL
// =============================================================================

/// An observable mutable cell.
///
/// `set` ignores writes equal to the current value, so subscribers only hear
/// about real changes. Cloning a `Signal` yields another handle to the same
/// cell.
pub struct Signal<T> {
    value: Rc<RefCell<T>>,
    listeners: Emitter<T>,
    runtime: Runtime,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self { value: Rc::clone(&self.value), listeners: self.listeners.clone(), runtime: self.runtime.clone() }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(runtime: &Runtime, value: T) -> Self {
        Self { value: Rc::new(RefCell::new(value)), listeners: Emitter::new(), runtime: runtime.clone() }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.value.borrow())
    }

    /// Store `value`; returns `false` (and notifies nobody) when it equals
    /// the current value.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        let listeners = self.listeners.clone();
        self.runtime.schedule(Box::new(move || listeners.emit(&value)));
        true
    }

    /// Compute a new value from the current one and store it.
    pub fn update(&self, change: impl FnOnce(&T) -> T) -> bool {
        let next = change(&self.value.borrow());
        self.set(next)
    }

    /// Listen for changes. Listeners receive the value that was written.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        self.listeners.subscribe(handler)
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.value.borrow()).finish()
    }
}
