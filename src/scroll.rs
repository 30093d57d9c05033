//! Scroll tracking: baselines, per-frame delta batching, and the
//! container-to-owner index that scopes where a delta applies.
//!
//! DESIGN
//! ======
//! A pure scroll shifts descendant geometry without resizing anything, so a
//! stored rect can be translated instead of re-measured. Three pieces make
//! that work:
//!
//! - [`ScrollParents`] is built at node-registration time. For each owner it
//!   records the ordered scroll containers above its node (nearest first,
//!   document root last), and inverts that into `container -> owners`.
//! - [`ScrollTracker`] snapshots container offsets at drag start and turns
//!   each scroll event into a delta against the last snapshot.
//! - [`ScrollBatch`] coalesces deltas per container within one animation
//!   frame; applying a frame costs O(scrolled containers).
//!
//! Deltas are expressed as content movement: scrolling a container down by
//! 30px yields `dy = -30`, which is exactly the translation its descendants'
//! rects need.

#[cfg(test)]
#[path = "scroll_test.rs"]
mod scroll_test;

use std::collections::{BTreeSet, HashMap};

use crate::dom::{Document, NodeId};
use crate::geometry::Position;
use crate::registry::Owner;

/// Translation to apply to rects inside a scrolled container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollDelta {
    pub dx: f64,
    pub dy: f64,
}

impl ScrollDelta {
    #[must_use]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Scroll containers enclosing `node`, nearest first, ending with the
/// document root. `node` itself is not included.
#[must_use]
pub fn scroll_parents(document: &dyn Document, node: NodeId) -> Vec<NodeId> {
    let root = document.root();
    let mut parents = Vec::new();
    let mut cursor = document.parent(node);
    while let Some(ancestor) = cursor {
        if ancestor != root && document.is_scroll_container(ancestor) {
            parents.push(ancestor);
        }
        cursor = document.parent(ancestor);
    }
    if node != root {
        parents.push(root);
    }
    parents
}

// =============================================================================
// SCROLL PARENT INDEX
// =============================================================================

#[derive(Debug, Default)]
pub struct ScrollParents {
    by_owner: HashMap<Owner, Vec<NodeId>>,
    by_container: HashMap<NodeId, BTreeSet<Owner>>,
}

impl ScrollParents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)build the entry for `owner`, whose node is now `node`.
    pub fn index(&mut self, document: &dyn Document, owner: &Owner, node: NodeId) {
        self.remove(owner);
        let containers = scroll_parents(document, node);
        for container in &containers {
            self.by_container.entry(*container).or_default().insert(owner.clone());
        }
        self.by_owner.insert(owner.clone(), containers);
    }

    pub fn remove(&mut self, owner: &Owner) {
        let Some(containers) = self.by_owner.remove(owner) else {
            return;
        };
        for container in containers {
            if let Some(owners) = self.by_container.get_mut(&container) {
                owners.remove(owner);
                if owners.is_empty() {
                    self.by_container.remove(&container);
                }
            }
        }
    }

    #[must_use]
    pub fn containers(&self, owner: &Owner) -> &[NodeId] {
        self.by_owner.get(owner).map(Vec::as_slice).unwrap_or_default()
    }

    /// Owners whose node sits inside `container`, in stable order.
    pub fn affected(&self, container: NodeId) -> impl Iterator<Item = &Owner> {
        self.by_container.get(&container).into_iter().flatten()
    }

    /// Every container any indexed owner depends on.
    pub fn all_containers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_container.keys().copied()
    }
}

// =============================================================================
// SCROLL TRACKER
// =============================================================================

/// Per-drag scroll offset snapshots.
#[derive(Debug, Default)]
pub struct ScrollTracker {
    baselines: HashMap<NodeId, Position>,
}

impl ScrollTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the document root and every scroll container above
    /// `element`, plus any `extra` containers (those holding drop targets).
    pub fn init(&mut self, document: &dyn Document, element: NodeId, extra: impl IntoIterator<Item = NodeId>) {
        self.baselines.clear();
        let root = document.root();
        self.baselines.insert(root, document.scroll_offset(root));
        for container in scroll_parents(document, element).into_iter().chain(extra) {
            self.baselines.insert(container, document.scroll_offset(container));
        }
    }

    /// Compare `container`'s offset with its snapshot and advance the
    /// snapshot. Returns `None` for an unchanged offset; a container never
    /// seen before is snapshotted and also yields `None`.
    pub fn record(&mut self, document: &dyn Document, container: NodeId) -> Option<ScrollDelta> {
        let current = document.scroll_offset(container);
        let previous = self.baselines.insert(container, current)?;
        let delta = ScrollDelta::new(previous.x - current.x, previous.y - current.y);
        if delta.is_zero() { None } else { Some(delta) }
    }

    #[must_use]
    pub fn baseline(&self, container: NodeId) -> Option<Position> {
        self.baselines.get(&container).copied()
    }

    pub fn clear(&mut self) {
        self.baselines.clear();
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        !self.baselines.is_empty()
    }
}

// =============================================================================
// SCROLL BATCH
// =============================================================================

/// Deltas waiting for the next animation frame, summed per container in
/// first-scrolled order.
#[derive(Debug, Default)]
pub struct ScrollBatch {
    pending: Vec<(NodeId, ScrollDelta)>,
}

impl ScrollBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, container: NodeId, delta: ScrollDelta) {
        if let Some((_, total)) = self.pending.iter_mut().find(|(c, _)| *c == container) {
            total.dx += delta.dx;
            total.dy += delta.dy;
        } else {
            self.pending.push((container, delta));
        }
    }

    /// Remove and return everything queued for this frame.
    pub fn take(&mut self) -> Vec<(NodeId, ScrollDelta)> {
        std::mem::take(&mut self.pending)
    }

    /// Drop everything queued without applying it.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
