//! # Hierarchy & Transform Engine
//!
//! Keeps world and local transforms consistent across reparenting and
//! arbitrary mutation order.
//!
//! ## Invariant
//!
//! After any call here returns, every object with a parent satisfies
//! `world == parent_world * local`. A node without a parent stores its
//! world transform as its local one.
//!
//! ## Node lifecycle
//!
//! ```text
//!   no node ──set_parent──> child node ──detach──> root node ──gc──> no node
//!                 ▲                                    │
//!                 └──────────── set_parent ────────────┘
//! ```
//!
//! A node is garbage-collected (swap-with-last) as soon as it has neither
//! a parent nor children.

use arbor_shared::{Quaternion, Transform, Vec3};

use super::events::RegistryEvent;
use super::hierarchy::HierarchyNode;
use super::object::ObjectId;
use super::registry::Registry;
use crate::error::{RegistryError, RegistryResult};

impl Registry {
    // =========================================================================
    // Hierarchy queries
    // =========================================================================

    fn node_index(&self, id: ObjectId) -> Option<u32> {
        self.objects.get(id)?.hierarchy_index
    }

    fn node(&self, id: ObjectId) -> Option<&HierarchyNode> {
        self.hierarchy.get(self.node_index(id)?)
    }

    fn node_mut(&mut self, id: ObjectId) -> Option<&mut HierarchyNode> {
        let index = self.node_index(id)?;
        self.hierarchy.get_mut(index)
    }

    /// The parent of `id`, or null.
    #[must_use]
    pub fn parent(&self, id: ObjectId) -> ObjectId {
        self.node(id).map_or(ObjectId::NULL, |node| node.parent)
    }

    /// The most recently attached child of `id`, or null.
    #[must_use]
    pub fn first_child(&self, id: ObjectId) -> ObjectId {
        self.node(id).map_or(ObjectId::NULL, |node| node.first_child)
    }

    /// The next child of the same parent, or null.
    #[must_use]
    pub fn next_sibling(&self, id: ObjectId) -> ObjectId {
        self.node(id).map_or(ObjectId::NULL, |node| node.next_sibling)
    }

    /// Iterates over the direct children of `id`, most recent first.
    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        let first = self.first_child(id);
        std::iter::successors((!first.is_null()).then_some(first), move |child| {
            let next = self.next_sibling(*child);
            (!next.is_null()).then_some(next)
        })
    }

    /// Checks if `ancestor` is a strict ancestor of `id`.
    ///
    /// Walks at most as many parent links as there are nodes, so a
    /// corrupt cyclic hierarchy still terminates.
    #[must_use]
    pub fn is_descendant(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        if ancestor.is_null() {
            return false;
        }
        let mut current = self.parent(id);
        for _ in 0..=self.hierarchy.len() {
            if current.is_null() {
                return false;
            }
            if current == ancestor {
                return true;
            }
            current = self.parent(current);
        }
        false
    }

    /// Validates every hierarchy node.
    ///
    /// Snapshot loading trusts stored hierarchy data; call this after
    /// loading untrusted input.
    ///
    /// # Errors
    ///
    /// Returns error at the first node that is unowned, points at dead
    /// objects, is missing from its parent's child list, or sits on a
    /// parent chain that loops or exceeds `max_hierarchy_depth`.
    pub fn check_hierarchy(&self) -> RegistryResult<()> {
        let corrupt = |object: ObjectId, reason: &'static str| {
            Err(RegistryError::CorruptHierarchy { object, reason })
        };

        for (index, node) in self.hierarchy.nodes().iter().enumerate() {
            let object = node.object;
            if self.node_index(object) != Some(index as u32) {
                return corrupt(object, "node is not owned by its object");
            }
            for linked in [node.parent, node.first_child, node.next_sibling] {
                if !linked.is_null() && self.node(linked).is_none() {
                    return corrupt(object, "node links to an object without a node");
                }
            }
            if !node.parent.is_null()
                && !self
                    .children(node.parent)
                    .take(self.hierarchy.len())
                    .any(|c| c == object)
            {
                return corrupt(object, "node is missing from its parent's child list");
            }

            let mut depth = 0;
            let mut current = node.parent;
            while !current.is_null() {
                if current == object {
                    return corrupt(object, "parent chain contains a cycle");
                }
                depth += 1;
                if depth > self.config.max_hierarchy_depth || depth > self.hierarchy.len() {
                    return corrupt(object, "parent chain is too deep");
                }
                current = self.parent(current);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Reparenting
    // =========================================================================

    /// Makes `new_parent` the parent of `child`, keeping `child`'s world
    /// placement. A null or dead `new_parent` detaches `child` to the root.
    ///
    /// # Errors
    ///
    /// Returns error, leaving the hierarchy untouched, if `child` is not
    /// alive or if `new_parent` is `child` or one of its descendants.
    pub fn set_parent(&mut self, new_parent: ObjectId, child: ObjectId) -> RegistryResult<()> {
        if !self.has_object(child) {
            return Err(RegistryError::DeadObject(child));
        }
        let new_parent = if self.has_object(new_parent) {
            new_parent
        } else {
            ObjectId::NULL
        };

        if !new_parent.is_null() && (new_parent == child || self.is_descendant(child, new_parent)) {
            tracing::error!(
                "Hierarchy can not contain a cycle: {} can not become the parent of {}",
                new_parent,
                child
            );
            return Err(RegistryError::HierarchyCycle {
                parent: new_parent,
                child,
            });
        }

        self.detach(child);
        if new_parent.is_null() {
            return Ok(());
        }

        let child_index = self.ensure_node(child);
        let parent_index = self.ensure_node(new_parent);

        let local = self.transform(new_parent).inverse() * self.transform(child);
        let Some(parent_node) = self.hierarchy.get_mut(parent_index) else {
            return Ok(());
        };
        let next_sibling = std::mem::replace(&mut parent_node.first_child, child);

        if let Some(node) = self.hierarchy.get_mut(child_index) {
            node.parent = new_parent;
            node.next_sibling = next_sibling;
            node.local = local;
        }
        Ok(())
    }

    /// Unlinks `id` from its parent, if any, and collects whichever nodes
    /// became unused. The object keeps its world transform.
    pub(crate) fn detach(&mut self, id: ObjectId) {
        let Some(node) = self.node(id).copied() else {
            return;
        };

        if !node.parent.is_null() {
            self.unlink_from_siblings(node.parent, id, node.next_sibling);
            let world = self.transform(id);
            if let Some(node) = self.node_mut(id) {
                node.parent = ObjectId::NULL;
                node.next_sibling = ObjectId::NULL;
                node.local = world;
            }
            self.collect_garbage(node.parent);
        }
        self.collect_garbage(id);
    }

    fn unlink_from_siblings(&mut self, parent: ObjectId, child: ObjectId, next: ObjectId) {
        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        if parent_node.first_child == child {
            parent_node.first_child = next;
            return;
        }

        let mut current = parent_node.first_child;
        while !current.is_null() {
            let Some(node) = self.node_mut(current) else {
                return;
            };
            if node.next_sibling == child {
                node.next_sibling = next;
                return;
            }
            current = node.next_sibling;
        }
    }

    fn ensure_node(&mut self, id: ObjectId) -> u32 {
        if let Some(index) = self.node_index(id) {
            return index;
        }
        let index = self.hierarchy.push(HierarchyNode::root(id, self.transform(id)));
        if let Some(record) = self.objects.get_mut(id) {
            record.hierarchy_index = Some(index);
        }
        index
    }

    fn collect_garbage(&mut self, id: ObjectId) {
        let Some(index) = self.node_index(id) else {
            return;
        };
        if !self.hierarchy.get(index).is_some_and(HierarchyNode::is_unused) {
            return;
        }

        let moved = self.hierarchy.swap_remove(index);
        if let Some(record) = self.objects.get_mut(id) {
            record.hierarchy_index = None;
        }
        if let Some(record) = moved.and_then(|m| self.objects.get_mut(m)) {
            record.hierarchy_index = Some(index);
        }
        tracing::debug!("Hierarchy node of object {} collected", id);
    }

    // =========================================================================
    // World transform
    // =========================================================================

    /// World transform of `id`, or the identity if it is not alive.
    #[must_use]
    pub fn transform(&self, id: ObjectId) -> Transform {
        self.objects.get(id).map_or(Transform::IDENTITY, |r| r.transform)
    }

    /// World position of `id`, or zero.
    #[must_use]
    pub fn position(&self, id: ObjectId) -> Vec3 {
        self.transform(id).position
    }

    /// World rotation of `id`, or the identity.
    #[must_use]
    pub fn rotation(&self, id: ObjectId) -> Quaternion {
        self.transform(id).rotation
    }

    /// World scale of `id`, or one.
    #[must_use]
    pub fn scale(&self, id: ObjectId) -> f32 {
        self.transform(id).scale
    }

    /// Sets the world position and moves the children along.
    pub fn set_position(&mut self, id: ObjectId, position: Vec3) {
        self.update_world(id, |t| t.position = position);
    }

    /// Sets the world rotation and moves the children along.
    pub fn set_rotation(&mut self, id: ObjectId, rotation: Quaternion) {
        self.update_world(id, |t| t.rotation = rotation);
    }

    /// Sets the world scale and moves the children along.
    pub fn set_scale(&mut self, id: ObjectId, scale: f32) {
        self.update_world(id, |t| t.scale = scale);
    }

    /// Sets the whole world transform and moves the children along.
    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) {
        self.update_world(id, |t| *t = transform);
    }

    fn update_world(&mut self, id: ObjectId, update: impl FnOnce(&mut Transform)) {
        let Some(record) = self.objects.get_mut(id) else {
            return;
        };
        update(&mut record.transform);
        self.propagate(id, true);
    }

    /// Sets the world transform of `id` without moving its children.
    ///
    /// The children keep their world placement; their local transforms
    /// are recomputed against the new parent transform.
    pub fn set_transform_keep_children(&mut self, id: ObjectId, transform: Transform) {
        let Some(record) = self.objects.get_mut(id) else {
            return;
        };
        record.transform = transform;

        let parent = self.parent(id);
        let local = if parent.is_null() {
            transform
        } else {
            self.transform(parent).inverse() * transform
        };
        if let Some(node) = self.node_mut(id) {
            node.local = local;
        }

        let inverse = transform.inverse();
        let children: Vec<ObjectId> = self.children(id).collect();
        for child in children {
            let child_world = self.transform(child);
            if let Some(node) = self.node_mut(child) {
                node.local = inverse * child_world;
            }
        }
        self.events.emit(&RegistryEvent::ObjectMoved(id));
    }

    // =========================================================================
    // Local transform
    // =========================================================================

    /// Transform of `id` relative to its parent.
    ///
    /// Equal to the world transform when `id` has no parent.
    #[must_use]
    pub fn local_transform(&self, id: ObjectId) -> Transform {
        match self.node(id) {
            Some(node) if !node.parent.is_null() => node.local,
            _ => self.transform(id),
        }
    }

    /// Position relative to the parent.
    #[must_use]
    pub fn local_position(&self, id: ObjectId) -> Vec3 {
        self.local_transform(id).position
    }

    /// Rotation relative to the parent.
    #[must_use]
    pub fn local_rotation(&self, id: ObjectId) -> Quaternion {
        self.local_transform(id).rotation
    }

    /// Scale relative to the parent.
    #[must_use]
    pub fn local_scale(&self, id: ObjectId) -> f32 {
        self.local_transform(id).scale
    }

    /// Sets the position relative to the parent. Without a parent this
    /// is the world position.
    pub fn set_local_position(&mut self, id: ObjectId, position: Vec3) {
        self.update_local(id, |t| t.position = position);
    }

    /// Sets the rotation relative to the parent. Without a parent this
    /// is the world rotation.
    pub fn set_local_rotation(&mut self, id: ObjectId, rotation: Quaternion) {
        self.update_local(id, |t| t.rotation = rotation);
    }

    /// Sets the scale relative to the parent. Without a parent this is
    /// the world scale.
    pub fn set_local_scale(&mut self, id: ObjectId, scale: f32) {
        self.update_local(id, |t| t.scale = scale);
    }

    /// Sets the whole transform relative to the parent. Without a parent
    /// this is the world transform.
    pub fn set_local_transform(&mut self, id: ObjectId, transform: Transform) {
        self.update_local(id, |t| *t = transform);
    }

    fn update_local(&mut self, id: ObjectId, update: impl FnOnce(&mut Transform)) {
        let parent = self.parent(id);
        if parent.is_null() {
            self.update_world(id, update);
            return;
        }

        let parent_world = self.transform(parent);
        let Some(node) = self.node_mut(id) else {
            return;
        };
        update(&mut node.local);
        let world = parent_world * node.local;

        if let Some(record) = self.objects.get_mut(id) {
            record.transform = world;
        }
        self.propagate(id, false);
    }

    /// Announces that `id` moved and pushes its world transform down the
    /// subtree.
    ///
    /// With `update_local`, the local transform of `id` itself is first
    /// rederived from its (authoritative) world transform. Descendants'
    /// local transforms are never rewritten here.
    fn propagate(&mut self, id: ObjectId, update_local: bool) {
        self.events.emit(&RegistryEvent::ObjectMoved(id));

        let Some(node) = self.node(id).copied() else {
            return;
        };
        let world = self.transform(id);

        if update_local {
            let local = if node.parent.is_null() {
                world
            } else {
                self.transform(node.parent).inverse() * world
            };
            if let Some(node) = self.node_mut(id) {
                node.local = local;
            }
        }

        let mut child = node.first_child;
        while !child.is_null() {
            let Some(child_node) = self.node(child).copied() else {
                break;
            };
            if let Some(record) = self.objects.get_mut(child) {
                record.transform = world * child_node.local;
            }
            self.propagate(child, false);
            child = child_node.next_sibling;
        }
    }
}
