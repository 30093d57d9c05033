//! The drag overlay: the floating proxy that follows the pointer.
//!
//! Its size comes from measuring the overlay node; its origin is the
//! modifier-adjusted position the engine computes each frame.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::consts::OVERLAY_RECT_ID;
use crate::dom::{Document, NodeId};
use crate::geometry::{Bounds, Position, Rect};
use crate::rect::TrackedRect;
use crate::signal::{Runtime, Signal, Subscription};

#[derive(Debug, Clone)]
pub struct Overlay {
    node: Signal<Option<NodeId>>,
    position: Signal<Position>,
    rect: TrackedRect,
}

impl Overlay {
    #[must_use]
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            node: Signal::new(runtime, None),
            position: Signal::new(runtime, Position::default()),
            rect: TrackedRect::new(runtime, OVERLAY_RECT_ID),
        }
    }

    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node.get()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position.get()
    }

    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.rect.get()
    }

    /// Mount (`Some`) or unmount (`None`) the overlay node. A mounted node is
    /// measured for its size and placed at the current position.
    pub fn set_node(&self, document: &dyn Document, node: Option<NodeId>) {
        self.node.set(node);
        self.remeasure(document);
    }

    /// Re-read the overlay node's size, keeping the current position.
    pub fn remeasure(&self, document: &dyn Document) {
        let measured = self.node.get().and_then(|node| document.measure(node));
        match measured {
            Some(bounds) => {
                let origin = self.position.get();
                self.rect.update(Bounds::new(origin.x, origin.y, bounds.width, bounds.height));
            }
            None => {
                self.rect.clear();
            }
        }
    }

    /// Move the overlay. The rect follows when the node is mounted.
    pub fn set_position(&self, position: Position) {
        self.position.set(position);
        self.rect.update_position(position);
    }

    pub fn subscribe_position(&self, handler: impl Fn(&Position) + 'static) -> Subscription {
        self.position.subscribe(handler)
    }

    pub fn subscribe_rect(&self, handler: impl Fn(&Option<Rect>) + 'static) -> Subscription {
        self.rect.subscribe(handler)
    }
}
