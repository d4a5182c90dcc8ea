//! # Packed Records
//!
//! Fixed-size, padding-free images of object slots and hierarchy nodes.
//! Written and read as raw little-endian bytes.

use arbor_shared::Transform;
use bytemuck::{Pod, Zeroable};

use crate::ecs::{FreeLink, HierarchyNode, ObjectId, ObjectRecord, Slot};

/// Marker for "no hierarchy node" in [`PackedSlot::hierarchy_index`].
pub const NO_NODE: u32 = u32::MAX;

/// One object slot, live or free.
///
/// Size: 64 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedSlot {
    /// World transform. Zeroed for free slots.
    pub transform: Transform,
    /// Attached component types.
    pub component_mask: u64,
    /// Hierarchy node index or [`NO_NODE`].
    pub hierarchy_index: u32,
    /// 1 for a live slot, 0 for a free one.
    pub alive: u32,
    /// Previous free slot (free slots only).
    pub free_prev: u32,
    /// Next free slot (free slots only).
    pub free_next: u32,
    _padding: [u32; 2],
}

impl PackedSlot {
    /// Packs a slot.
    #[must_use]
    pub fn pack(slot: &Slot) -> Self {
        let mut packed = Self::zeroed();
        match slot {
            Slot::Live(record) => {
                packed.transform = record.transform;
                packed.component_mask = record.component_mask;
                packed.hierarchy_index = record.hierarchy_index.unwrap_or(NO_NODE);
                packed.alive = 1;
                packed.free_prev = ObjectId::NULL.index();
                packed.free_next = ObjectId::NULL.index();
            }
            Slot::Free(link) => {
                packed.hierarchy_index = NO_NODE;
                packed.free_prev = link.prev.index();
                packed.free_next = link.next.index();
            }
        }
        packed
    }

    /// Returns true if the slot was live.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive != 0
    }

    /// The live record. The name index is left for the name table to relink.
    #[must_use]
    pub fn record(&self) -> ObjectRecord {
        ObjectRecord {
            transform: self.transform,
            hierarchy_index: (self.hierarchy_index != NO_NODE).then_some(self.hierarchy_index),
            name_index: None,
            component_mask: self.component_mask,
        }
    }

    /// The free-list links.
    #[must_use]
    pub const fn link(&self) -> FreeLink {
        FreeLink {
            prev: ObjectId::new(self.free_prev),
            next: ObjectId::new(self.free_next),
        }
    }
}

/// One hierarchy node.
///
/// Size: 48 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedNode {
    /// Owning object.
    pub object: u32,
    /// Parent object or null.
    pub parent: u32,
    /// First child or null.
    pub first_child: u32,
    /// Next sibling or null.
    pub next_sibling: u32,
    /// Transform relative to the parent.
    pub local: Transform,
}

impl PackedNode {
    /// Packs a node.
    #[must_use]
    pub const fn pack(node: &HierarchyNode) -> Self {
        Self {
            object: node.object.index(),
            parent: node.parent.index(),
            first_child: node.first_child.index(),
            next_sibling: node.next_sibling.index(),
            local: node.local,
        }
    }

    /// Unpacks the node.
    #[must_use]
    pub const fn node(&self) -> HierarchyNode {
        HierarchyNode {
            object: ObjectId::new(self.object),
            parent: ObjectId::new(self.parent),
            first_child: ObjectId::new(self.first_child),
            next_sibling: ObjectId::new(self.next_sibling),
            local: self.local,
        }
    }
}
