//! # Component Dispatch
//!
//! The registry never stores component data. Modules own their components
//! and register themselves as the owner of a component type:
//! - Each type is a small id (0-63) matching one bit of an object's mask
//! - The registry keeps one owner per type in a fixed 64-entry table
//! - Creation, destruction and persistence go through the owner
//!
//! Owners are called with the registry borrowed mutably. An owner must
//! not destroy the object it is being called for, and must not call back
//! into a registry method that locks the same owner (`component`,
//! `first_component`, `next_component`), since owner locks are not
//! reentrant.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::object::ObjectId;
use super::registry::Registry;
use crate::error::SnapshotResult;
use crate::snapshot::{SnapshotReader, SnapshotWriter};

/// Number of component types the registry can dispatch.
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Identifier of a component type (0-63).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentType(u8);

impl ComponentType {
    /// Sentinel for "no component type".
    pub const INVALID: Self = Self(u8::MAX);

    /// Creates a component type.
    ///
    /// # Panics
    ///
    /// Panics if `id` is 64 or more.
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        assert!((id as usize) < MAX_COMPONENT_TYPES, "component type id out of range");
        Self(id)
    }

    /// Creates a component type, or None if `id` is out of range.
    #[inline]
    #[must_use]
    pub const fn try_new(id: u8) -> Option<Self> {
        if (id as usize) < MAX_COMPONENT_TYPES {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Returns true unless this is the sentinel.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < MAX_COMPONENT_TYPES
    }

    /// The mask bit for this type. Zero for the sentinel.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u64 {
        if self.is_valid() {
            1 << self.0
        } else {
            0
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, owner-defined component handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentHandle(pub u32);

impl ComponentHandle {
    /// Sentinel for "no component".
    pub const INVALID: Self = Self(u32::MAX);

    /// Returns true unless this is the sentinel.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Capability a module implements to own one or more component types.
pub trait ComponentOwner: Send {
    /// Creates a component on `object`.
    ///
    /// Implementations must report it with [`Registry::add_component`].
    fn create_component(
        &mut self,
        registry: &mut Registry,
        object: ObjectId,
        component_type: ComponentType,
    ) -> ComponentHandle;

    /// Destroys the component on `object`.
    ///
    /// Implementations must report it with [`Registry::destroy_component`];
    /// the registry asserts the object's bit is clear afterwards.
    fn destroy_component(
        &mut self,
        registry: &mut Registry,
        object: ObjectId,
        component_type: ComponentType,
    );

    /// Resolves the handle of the component attached to `object`.
    fn resolve_component(&self, object: ObjectId, component_type: ComponentType) -> ComponentHandle;

    /// Writes the component payload.
    fn serialize_component(
        &self,
        writer: &mut SnapshotWriter,
        object: ObjectId,
        component_type: ComponentType,
    );

    /// Reads a payload written by `serialize_component`.
    ///
    /// The object's component bit has already been restored by the
    /// registry snapshot; implementations only rebuild their own state.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is truncated or malformed.
    fn deserialize_component(
        &mut self,
        reader: &mut SnapshotReader<'_>,
        object: ObjectId,
        component_type: ComponentType,
        version: u32,
    ) -> SnapshotResult<()>;
}

/// Shared reference to a component owner.
pub type OwnerRef = Arc<Mutex<dyn ComponentOwner>>;

/// Transient reference to one component. Never owns it.
#[derive(Clone)]
pub struct ComponentUid {
    /// The object the component is attached to.
    pub object: ObjectId,
    /// The component type.
    pub component_type: ComponentType,
    /// The owning module.
    pub owner: Option<OwnerRef>,
    /// Owner-defined handle.
    pub handle: ComponentHandle,
}

impl ComponentUid {
    /// Sentinel returned when no component matches.
    pub const INVALID: Self = Self {
        object: ObjectId::NULL,
        component_type: ComponentType::INVALID,
        owner: None,
        handle: ComponentHandle::INVALID,
    };

    /// Returns true unless this is the sentinel.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.object.is_null() && self.component_type.is_valid()
    }
}

impl PartialEq for ComponentUid {
    fn eq(&self, other: &Self) -> bool {
        let same_owner = match (&self.owner, &other.owner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_owner
            && self.object == other.object
            && self.component_type == other.component_type
            && self.handle == other.handle
    }
}

impl fmt::Debug for ComponentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentUid")
            .field("object", &self.object)
            .field("component_type", &self.component_type)
            .field("has_owner", &self.owner.is_some())
            .field("handle", &self.handle)
            .finish()
    }
}

/// Fixed table mapping each component type to its owner.
pub struct ComponentTypeTable {
    owners: [Option<OwnerRef>; MAX_COMPONENT_TYPES],
}

impl ComponentTypeTable {
    /// Creates a table with no owners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owners: std::array::from_fn(|_| None),
        }
    }

    /// Registers `owner` for `component_type`. The last registration wins.
    pub fn register(&mut self, component_type: ComponentType, owner: OwnerRef) {
        if let Some(slot) = self.owners.get_mut(component_type.index()) {
            *slot = Some(owner);
        }
    }

    /// Returns the owner of `component_type`.
    #[inline]
    #[must_use]
    pub fn owner(&self, component_type: ComponentType) -> Option<&OwnerRef> {
        self.owners.get(component_type.index())?.as_ref()
    }

    /// Iterates over registered types in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentType, &OwnerRef)> {
        self.owners
            .iter()
            .enumerate()
            .filter_map(|(id, owner)| Some((ComponentType(id as u8), owner.as_ref()?)))
    }
}

impl Default for ComponentTypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentTypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(component_type, _)| component_type))
            .finish()
    }
}
