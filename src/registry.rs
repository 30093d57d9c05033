//! Node registry: which host node belongs to which draggable or droppable.
//!
//! DESIGN
//! ======
//! Drag and drop ids live in separate namespaces, each a `node -> id` map.
//! Registration is the sole owner of an association; models must unregister
//! when their node is cleared or they are disposed. Unregistering is guarded
//! by the expected id, so a late teardown of a replaced model can never
//! remove its successor's association. Every lookup returns an empty result
//! on a miss.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::collections::HashMap;
use std::fmt;

use crate::dom::{Document, NodeId};

/// A registered model identity, namespaced by kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    Drag(String),
    Drop(String),
}

impl Owner {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Drag(id) | Self::Drop(id) => id,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drag(id) => write!(f, "drag:{id}"),
            Self::Drop(id) => write!(f, "drop:{id}"),
        }
    }
}

/// Bidirectional lookup between host nodes and model ids.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    drag: HashMap<NodeId, String>,
    drop: HashMap<NodeId, String>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_drag(&mut self, node: NodeId, id: &str) {
        self.drag.insert(node, id.to_string());
    }

    pub fn register_drop(&mut self, node: NodeId, id: &str) {
        self.drop.insert(node, id.to_string());
    }

    /// Remove `node`'s drag association if it still points at `id`.
    pub fn unregister_drag(&mut self, node: NodeId, id: &str) -> bool {
        remove_if_owned(&mut self.drag, node, id)
    }

    /// Remove `node`'s drop association if it still points at `id`.
    pub fn unregister_drop(&mut self, node: NodeId, id: &str) -> bool {
        remove_if_owned(&mut self.drop, node, id)
    }

    pub fn register(&mut self, owner: &Owner, node: NodeId) {
        match owner {
            Owner::Drag(id) => self.register_drag(node, id),
            Owner::Drop(id) => self.register_drop(node, id),
        }
    }

    pub fn unregister(&mut self, owner: &Owner, node: NodeId) -> bool {
        match owner {
            Owner::Drag(id) => self.unregister_drag(node, id),
            Owner::Drop(id) => self.unregister_drop(node, id),
        }
    }

    #[must_use]
    pub fn drag_id(&self, node: NodeId) -> Option<&str> {
        self.drag.get(&node).map(String::as_str)
    }

    #[must_use]
    pub fn drop_id(&self, node: NodeId) -> Option<&str> {
        self.drop.get(&node).map(String::as_str)
    }

    /// The drag id registered for `node`, else its drop id.
    #[must_use]
    pub fn get_id(&self, node: NodeId) -> Option<&str> {
        self.drag_id(node).or_else(|| self.drop_id(node))
    }

    /// Walk from `target` up through its ancestors and return the first
    /// registered drag id.
    #[must_use]
    pub fn find_ancestor_drag_id(&self, document: &dyn Document, target: NodeId) -> Option<String> {
        find_ancestor(&self.drag, document, target)
    }

    /// Walk from `target` up through its ancestors and return the first
    /// registered drop id.
    #[must_use]
    pub fn find_ancestor_drop_id(&self, document: &dyn Document, target: NodeId) -> Option<String> {
        find_ancestor(&self.drop, document, target)
    }

    /// `node` is registered as drag `id` and still attached.
    #[must_use]
    pub fn is_valid_drag_node(&self, document: &dyn Document, node: NodeId, id: &str) -> bool {
        self.drag_id(node) == Some(id) && document.is_connected(node)
    }

    /// `node` is registered as drop `id` and still attached.
    #[must_use]
    pub fn is_valid_drop_node(&self, document: &dyn Document, node: NodeId, id: &str) -> bool {
        self.drop_id(node) == Some(id) && document.is_connected(node)
    }

    #[must_use]
    pub fn is_valid(&self, document: &dyn Document, owner: &Owner, node: NodeId) -> bool {
        match owner {
            Owner::Drag(id) => self.is_valid_drag_node(document, node, id),
            Owner::Drop(id) => self.is_valid_drop_node(document, node, id),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drag.len() + self.drop.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_if_owned(map: &mut HashMap<NodeId, String>, node: NodeId, id: &str) -> bool {
    if map.get(&node).is_some_and(|current| current == id) {
        map.remove(&node);
        return true;
    }
    false
}

fn find_ancestor(map: &HashMap<NodeId, String>, document: &dyn Document, target: NodeId) -> Option<String> {
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        if let Some(id) = map.get(&node) {
            return Some(id.clone());
        }
        cursor = document.parent(node);
    }
    None
}
