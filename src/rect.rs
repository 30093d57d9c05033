//! Tracked rects: the observable geometry cell each model owns.
//!
//! Three ways to change a tracked rect, from most to least expensive:
//! [`TrackedRect::update`] takes a fresh layout measurement and skips the
//! write when nothing changed; [`TrackedRect::update_with_offset`]
//! translates the stored rect when a scroll moved content under an
//! unchanged layout box; [`TrackedRect::update_position`] moves the rect to
//! a new origin at fixed size (the overlay following the pointer).

#[cfg(test)]
#[path = "rect_test.rs"]
mod rect_test;

use crate::geometry::{Bounds, Position, Rect};
use crate::signal::{Runtime, Signal, Subscription};

/// An optional [`Rect`] tagged with a fixed owner id.
#[derive(Debug, Clone)]
pub struct TrackedRect {
    id: String,
    rect: Signal<Option<Rect>>,
}

impl TrackedRect {
    pub fn new(runtime: &Runtime, id: impl Into<String>) -> Self {
        Self { id: id.into(), rect: Signal::new(runtime, None) }
    }

    /// Owner id stamped on every stored rect.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn get(&self) -> Option<Rect> {
        self.rect.get()
    }

    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.rect.with(Option::is_some)
    }

    /// Replace the stored rect from a fresh measurement. Returns `false`
    /// when the stored rect already matches `bounds`.
    pub fn update(&self, bounds: Bounds) -> bool {
        if self.rect.with(|current| current.as_ref().is_some_and(|r| r.matches(&bounds))) {
            return false;
        }
        self.rect.set(Some(Rect::new(self.id.clone(), bounds)))
    }

    /// Translate the stored rect by `(dx, dy)`. No-op when unmeasured.
    pub fn update_with_offset(&self, dx: f64, dy: f64) -> bool {
        let Some(next) = self.rect.with(|current| current.as_ref().map(|r| r.translate(dx, dy))) else {
            return false;
        };
        self.rect.set(Some(next))
    }

    /// Move the stored rect's origin to `position`, keeping its size.
    /// No-op when unmeasured.
    pub fn update_position(&self, position: Position) -> bool {
        let Some(next) = self.rect.with(|current| current.as_ref().map(|r| r.at_position(position))) else {
            return false;
        };
        self.rect.set(Some(next))
    }

    /// Forget the stored rect (the node was cleared).
    pub fn clear(&self) -> bool {
        self.rect.set(None)
    }

    pub fn subscribe(&self, handler: impl Fn(&Option<Rect>) + 'static) -> Subscription {
        self.rect.subscribe(handler)
    }
}
