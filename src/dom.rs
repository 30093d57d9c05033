//! Host document boundary.
//!
//! The engine never owns UI nodes. It reads them through [`Document`], the
//! capability the UI-binding layer provides: parent links for ancestor
//! walks, liveness, layout measurement, scroll offsets, and computed
//! overflow. [`VirtualDom`] is a complete in-memory implementation used by
//! tests and the replay tool.

#[cfg(test)]
#[path = "dom_test.rs"]
mod dom_test;

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Position};

/// Opaque handle to a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Computed `overflow` of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Auto,
    Scroll,
}

/// Read-only view of the host's node tree.
pub trait Document {
    /// The document scrolling element. Always treated as a scroll container.
    fn root(&self) -> NodeId;

    /// Parent of `node`, or `None` at the top of its tree.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is currently attached under [`Document::root`].
    fn is_connected(&self, node: NodeId) -> bool;

    /// Viewport-relative layout box of `node`.
    fn measure(&self, node: NodeId) -> Option<Bounds>;

    /// Current scroll offsets of `node`.
    fn scroll_offset(&self, node: NodeId) -> Position;

    /// Computed overflow of `node`.
    fn overflow(&self, node: NodeId) -> Overflow;

    /// Whether scrolling `node` moves its descendants.
    fn is_scroll_container(&self, node: NodeId) -> bool {
        node == self.root() || matches!(self.overflow(node), Overflow::Auto | Overflow::Scroll)
    }

    /// Whether `node` is `ancestor` or lies somewhere beneath it.
    fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }
}

/// Error returned by [`VirtualDom`] mutations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("cannot attach {child:?} under its own descendant {parent:?}")]
    Cycle { child: NodeId, parent: NodeId },
    #[error("the root node cannot be detached")]
    DetachRoot,
}

#[derive(Debug, Clone)]
struct VirtualNode {
    parent: Option<NodeId>,
    /// Layout box in document space (before any scrolling).
    layout: Bounds,
    scroll: Position,
    overflow: Overflow,
}

#[derive(Debug)]
struct Tree {
    next_id: u64,
    nodes: HashMap<NodeId, VirtualNode>,
}

/// In-memory document.
///
/// Nodes hold document-space layout boxes; [`Document::measure`] subtracts
/// the scroll offsets of every ancestor, so scrolling a container moves the
/// measured boxes of everything inside it. Mutations take `&self` so a
/// document can be shared with an engine through `Rc` and still be changed
/// by the host.
#[derive(Debug)]
pub struct VirtualDom {
    tree: RefCell<Tree>,
}

impl Default for VirtualDom {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDom {
    pub const ROOT: NodeId = NodeId(0);

    /// Create a document containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            Self::ROOT,
            VirtualNode { parent: None, layout: Bounds::default(), scroll: Position::default(), overflow: Overflow::Auto },
        );
        Self { tree: RefCell::new(Tree { next_id: 1, nodes }) }
    }

    /// Append a new node with `overflow: visible` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if `parent` does not exist.
    pub fn create(&self, parent: NodeId, layout: Bounds) -> Result<NodeId, DomError> {
        self.create_with(parent, layout, Overflow::Visible)
    }

    /// Append a new `overflow: auto` node under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if `parent` does not exist.
    pub fn create_scrollable(&self, parent: NodeId, layout: Bounds) -> Result<NodeId, DomError> {
        self.create_with(parent, layout, Overflow::Auto)
    }

    /// Append a new node with an explicit overflow under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` if `parent` does not exist.
    pub fn create_with(&self, parent: NodeId, layout: Bounds, overflow: Overflow) -> Result<NodeId, DomError> {
        let mut tree = self.tree.borrow_mut();
        if !tree.nodes.contains_key(&parent) {
            return Err(DomError::UnknownNode(parent));
        }
        let id = NodeId(tree.next_id);
        tree.next_id += 1;
        tree.nodes
            .insert(id, VirtualNode { parent: Some(parent), layout, scroll: Position::default(), overflow });
        Ok(id)
    }

    /// Remove `node` (and its subtree) from the document tree. The node keeps
    /// existing and can be re-attached.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a missing node and `DetachRoot` for the root.
    pub fn detach(&self, node: NodeId) -> Result<(), DomError> {
        if node == Self::ROOT {
            return Err(DomError::DetachRoot);
        }
        self.node_mut(node, |n| n.parent = None)
    }

    /// Move `node` under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for missing nodes and `Cycle` when `parent` lies
    /// inside `node`'s subtree.
    pub fn attach(&self, node: NodeId, parent: NodeId) -> Result<(), DomError> {
        if !self.contains(parent) {
            return Err(DomError::UnknownNode(parent));
        }
        if node == Self::ROOT || self.is_inclusive_descendant(parent, node) {
            return Err(DomError::Cycle { child: node, parent });
        }
        self.node_mut(node, |n| n.parent = Some(parent))
    }

    /// Replace the document-space layout box of `node`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a missing node.
    pub fn set_bounds(&self, node: NodeId, layout: Bounds) -> Result<(), DomError> {
        self.node_mut(node, |n| n.layout = layout)
    }

    /// Set the computed overflow of `node`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a missing node.
    pub fn set_overflow(&self, node: NodeId, overflow: Overflow) -> Result<(), DomError> {
        self.node_mut(node, |n| n.overflow = overflow)
    }

    /// Set the absolute scroll offsets of `node`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a missing node.
    pub fn scroll_to(&self, node: NodeId, offset: Position) -> Result<(), DomError> {
        self.node_mut(node, |n| n.scroll = offset)
    }

    /// Scroll `node` by a relative amount.
    ///
    /// # Errors
    ///
    /// Returns `UnknownNode` for a missing node.
    pub fn scroll_by(&self, node: NodeId, dx: f64, dy: f64) -> Result<(), DomError> {
        self.node_mut(node, |n| n.scroll = n.scroll.offset(dx, dy))
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes.contains_key(&node)
    }

    fn node_mut(&self, node: NodeId, change: impl FnOnce(&mut VirtualNode)) -> Result<(), DomError> {
        let mut tree = self.tree.borrow_mut();
        let entry = tree.nodes.get_mut(&node).ok_or(DomError::UnknownNode(node))?;
        change(entry);
        Ok(())
    }
}

impl Document for VirtualDom {
    fn root(&self) -> NodeId {
        Self::ROOT
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let tree = self.tree.borrow();
        let mut cursor = node;
        loop {
            if cursor == Self::ROOT {
                return true;
            }
            match tree.nodes.get(&cursor).and_then(|n| n.parent) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    fn measure(&self, node: NodeId) -> Option<Bounds> {
        let tree = self.tree.borrow();
        let entry = tree.nodes.get(&node)?;
        let mut bounds = entry.layout;
        let mut cursor = entry.parent;
        while let Some(ancestor) = cursor {
            let Some(parent) = tree.nodes.get(&ancestor) else {
                break;
            };
            bounds = bounds.translate(-parent.scroll.x, -parent.scroll.y);
            cursor = parent.parent;
        }
        Some(bounds)
    }

    fn scroll_offset(&self, node: NodeId) -> Position {
        self.tree.borrow().nodes.get(&node).map(|n| n.scroll).unwrap_or_default()
    }

    fn overflow(&self, node: NodeId) -> Overflow {
        self.tree.borrow().nodes.get(&node).map(|n| n.overflow).unwrap_or_default()
    }
}
