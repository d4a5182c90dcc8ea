//! # Object Registry
//!
//! Objects with world transforms, optional names, a parent/child hierarchy
//! and a 64-bit mask of attached component types.
//!
//! ## Design Philosophy
//!
//! - Object ids are plain slot indices, recycled through a free list
//! - Names and hierarchy nodes are sparse side tables, compacted on removal
//! - Component data lives with the modules that own each component type
//! - Every mutation announces itself synchronously on the event bus

mod component;
mod events;
mod hierarchy;
mod names;
mod object;
mod registry;
mod transform;

pub use component::{
    ComponentHandle, ComponentOwner, ComponentType, ComponentTypeTable, ComponentUid, OwnerRef,
    MAX_COMPONENT_TYPES,
};
pub use events::{EventBus, EventKind, Listener, ListenerId, RegistryEvent};
pub use hierarchy::{HierarchyNode, HierarchyTable};
pub use names::{NameRecord, NameTable, NAME_CAPACITY};
pub use object::{placement, FreeLink, ObjectId, ObjectRecord, ObjectTable, Slot};
pub use registry::Registry;
