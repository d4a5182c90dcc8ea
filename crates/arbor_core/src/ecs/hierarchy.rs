//! # Hierarchy Table
//!
//! Sparse parent/child storage. Only objects that take part in a
//! parent/child relationship own a node; children of one parent form a
//! singly linked sibling list threaded through `next_sibling`.
//!
//! Nodes are removed with swap-with-last, so the owner of the node that
//! moves into the hole must be repointed by the caller.

use arbor_shared::Transform;

use super::object::ObjectId;

/// One object's place in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HierarchyNode {
    /// The object owning this node.
    pub object: ObjectId,
    /// Parent object, or null for a root.
    pub parent: ObjectId,
    /// Head of the child list, or null.
    pub first_child: ObjectId,
    /// Next child of the same parent, or null.
    pub next_sibling: ObjectId,
    /// Transform relative to the parent. Equal to the world transform
    /// while the node has no parent.
    pub local: Transform,
}

impl HierarchyNode {
    /// Creates a parentless, childless node.
    #[inline]
    #[must_use]
    pub const fn root(object: ObjectId, local: Transform) -> Self {
        Self {
            object,
            parent: ObjectId::NULL,
            first_child: ObjectId::NULL,
            next_sibling: ObjectId::NULL,
            local,
        }
    }

    /// Returns true if the node has neither a parent nor children.
    #[inline]
    #[must_use]
    pub const fn is_unused(&self) -> bool {
        self.parent.is_null() && self.first_child.is_null()
    }
}

/// Dense array of hierarchy nodes.
#[derive(Debug, Default)]
pub struct HierarchyTable {
    nodes: Vec<HierarchyNode>,
}

impl HierarchyTable {
    /// Creates an empty table with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node exists.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in storage order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    /// Gets a node by index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&HierarchyNode> {
        self.nodes.get(index as usize)
    }

    /// Gets a node mutably by index.
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut HierarchyNode> {
        self.nodes.get_mut(index as usize)
    }

    /// Appends a node and returns its index.
    pub fn push(&mut self, node: HierarchyNode) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        index
    }

    /// Removes the node at `index` by swapping the last node into it.
    ///
    /// Returns the owner of the node that moved into `index`, if any.
    pub fn swap_remove(&mut self, index: u32) -> Option<ObjectId> {
        let index = index as usize;
        if index >= self.nodes.len() {
            return None;
        }
        self.nodes.swap_remove(index);
        self.nodes.get(index).map(|node| node.object)
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_node_is_unused() {
        let node = HierarchyNode::root(ObjectId::new(4), Transform::IDENTITY);
        assert!(node.is_unused());

        let mut with_child = node;
        with_child.first_child = ObjectId::new(5);
        assert!(!with_child.is_unused());
    }

    #[test]
    fn test_swap_remove() {
        let mut table = HierarchyTable::default();
        for i in 0..3 {
            table.push(HierarchyNode::root(ObjectId::new(i), Transform::IDENTITY));
        }

        assert_eq!(table.swap_remove(0), Some(ObjectId::new(2)));
        assert_eq!(table.get(0).map(|n| n.object), Some(ObjectId::new(2)));
        assert_eq!(table.swap_remove(1), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.swap_remove(9), None);
    }
}
