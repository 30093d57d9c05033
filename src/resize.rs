//! Shared resize observer.
//!
//! One observer serves every registered node: a `node -> targets` map gives
//! O(1) node lookup, and the host's native observer callback feeds the whole
//! batch of changed nodes into [`ResizeObserver::notify`]. A node may serve
//! several targets at once (a draggable that also hosts the overlay, say);
//! each keeps its own entry. Pending nodes are re-measured together on the
//! next frame.

#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use std::collections::HashMap;

use crate::dom::NodeId;
use crate::registry::Owner;

/// What a resized node should re-measure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResizeTarget {
    Model(Owner),
    Overlay,
}

#[derive(Debug, Default)]
pub struct ResizeObserver {
    targets: HashMap<NodeId, Vec<ResizeTarget>>,
    pending: Vec<NodeId>,
}

impl ResizeObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, node: NodeId, target: ResizeTarget) {
        let targets = self.targets.entry(node).or_default();
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Stop observing `node` for `target`. Other targets on the same node are
    /// kept; the node itself is dropped once its last target goes.
    pub fn unobserve(&mut self, node: NodeId, target: &ResizeTarget) -> bool {
        let Some(targets) = self.targets.get_mut(&node) else {
            return false;
        };
        let Some(index) = targets.iter().position(|t| t == target) else {
            return false;
        };
        targets.remove(index);
        if targets.is_empty() {
            self.targets.remove(&node);
            self.pending.retain(|n| *n != node);
        }
        true
    }

    #[must_use]
    pub fn is_observing(&self, node: NodeId) -> bool {
        self.targets.contains_key(&node)
    }

    /// Queue observed nodes from a native resize batch. Unobserved nodes and
    /// duplicates are ignored. Returns how many nodes were newly queued.
    pub fn notify(&mut self, nodes: &[NodeId]) -> usize {
        let mut queued = 0;
        for node in nodes {
            if self.targets.contains_key(node) && !self.pending.contains(node) {
                self.pending.push(*node);
                queued += 1;
            }
        }
        queued
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the queue, pairing each node with every target it serves.
    pub fn take_pending(&mut self) -> Vec<(NodeId, ResizeTarget)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .flat_map(|node| {
                let targets = self.targets.get(&node).cloned().unwrap_or_default();
                targets.into_iter().map(move |target| (node, target))
            })
            .collect()
    }
}
