//! # Object Registry
//!
//! The central container for every object, its name, its place in the
//! hierarchy and the component types attached to it.
//!
//! Component data lives in the modules that own each component type; the
//! registry only tracks which types are attached and dispatches to the
//! owner. The transform and hierarchy operations are in `transform.rs`.

use arbor_shared::{Quaternion, Vec3};

use super::component::{
    ComponentHandle, ComponentOwner, ComponentType, ComponentTypeTable, ComponentUid, OwnerRef,
    MAX_COMPONENT_TYPES,
};
use super::events::{EventBus, EventKind, ListenerId, RegistryEvent};
use super::hierarchy::HierarchyTable;
use super::names::{NameRecord, NameTable};
use super::object::{placement, ObjectId, ObjectRecord, ObjectTable};
use crate::config::RegistryConfig;

/// The object registry.
///
/// Single owner: all mutation happens through `&mut self`, in program
/// order. Use [`crate::SharedRegistry`] when readers on other threads need
/// access between mutations.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::new();
///
/// let parent = registry.create_object(Vec3::ZERO, Quaternion::IDENTITY);
/// let child = registry.create_object(Vec3::ZERO, Quaternion::IDENTITY);
/// registry.set_parent(parent, child)?;
/// registry.set_local_position(child, Vec3::new(1.0, 0.0, 0.0));
/// registry.set_position(parent, Vec3::new(5.0, 0.0, 0.0));
/// assert_eq!(registry.position(child), Vec3::new(6.0, 0.0, 0.0));
/// ```
#[derive(Debug)]
pub struct Registry {
    pub(crate) objects: ObjectTable,
    pub(crate) names: NameTable,
    pub(crate) hierarchy: HierarchyTable,
    pub(crate) component_types: ComponentTypeTable,
    pub(crate) events: EventBus,
    pub(crate) config: RegistryConfig,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry, reserving the configured capacities.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            objects: ObjectTable::with_capacity(config.initial_objects),
            names: NameTable::with_capacity(config.initial_names),
            hierarchy: HierarchyTable::with_capacity(config.initial_hierarchy_nodes),
            component_types: ComponentTypeTable::new(),
            events: EventBus::new(),
            config,
        }
    }

    /// The configuration this registry was created with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Read access to the object table.
    #[inline]
    #[must_use]
    pub const fn object_table(&self) -> &ObjectTable {
        &self.objects
    }

    /// Read access to the hierarchy table.
    #[inline]
    #[must_use]
    pub const fn hierarchy_table(&self) -> &HierarchyTable {
        &self.hierarchy
    }

    /// Read access to the name table.
    #[inline]
    #[must_use]
    pub const fn name_table(&self) -> &NameTable {
        &self.names
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Subscribes `listener` to events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&RegistryEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Creates an object with unit scale, recycling a dead slot if any.
    pub fn create_object(&mut self, position: Vec3, rotation: Quaternion) -> ObjectId {
        let id = self
            .objects
            .allocate(ObjectRecord::new(placement(position, rotation)));
        tracing::trace!("Object {} created", id);
        self.events.emit(&RegistryEvent::ObjectCreated(id));
        id
    }

    /// Destroys an object. Does nothing if `id` is not alive.
    ///
    /// Children are detached first and keep their world placement. Every
    /// attached component is destroyed through its owner.
    ///
    /// # Panics
    ///
    /// Panics if a component owner does not clear its bit on destroy.
    pub fn destroy_object(&mut self, id: ObjectId) {
        if !self.has_object(id) {
            return;
        }

        loop {
            let child = self.first_child(id);
            if child.is_null() {
                break;
            }
            self.detach(child);
        }
        self.detach(id);

        let mut pending = self.component_mask(id);
        while pending != 0 {
            let component_type = ComponentType::new(pending.trailing_zeros() as u8);
            pending &= pending - 1;

            // an earlier destroyer may have taken this one down with it
            if !self.has_component(id, component_type) {
                continue;
            }

            match self.component_types.owner(component_type).cloned() {
                Some(owner) => {
                    owner.lock().destroy_component(self, id, component_type);
                    assert!(
                        !self.has_component(id, component_type),
                        "owner of component type {component_type} did not clear it on object {id}"
                    );
                }
                None => {
                    tracing::warn!(
                        "Object {} has component type {} with no registered owner",
                        id,
                        component_type
                    );
                    if let Some(record) = self.objects.get_mut(id) {
                        record.component_mask &= !component_type.bit();
                    }
                }
            }
        }

        if let Some(name_index) = self.objects.get(id).and_then(|r| r.name_index) {
            self.release_name(name_index);
        }

        self.objects.release(id);
        tracing::trace!("Object {} destroyed", id);
        self.events.emit(&RegistryEvent::ObjectDestroyed(id));
    }

    /// Forces the slot at `id` to hold a live object.
    ///
    /// Grows the table if needed; skipped slots become free. Used when
    /// rebuilding exact indices. Fires no event.
    pub fn emplace_object(&mut self, id: ObjectId) {
        self.objects.emplace(id);
    }

    /// Checks if an object is alive.
    #[inline]
    #[must_use]
    pub fn has_object(&self, id: ObjectId) -> bool {
        self.objects.is_alive(id)
    }

    /// Number of live objects.
    #[inline]
    #[must_use]
    pub const fn object_count(&self) -> usize {
        self.objects.alive_count()
    }

    /// Number of slots, live or dead.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.objects.len()
    }

    /// The lowest-index live object, or null.
    #[must_use]
    pub fn first_object(&self) -> ObjectId {
        self.objects.iter_alive().next().map_or(ObjectId::NULL, |(id, _)| id)
    }

    /// The next live object after `id` in index order, or null.
    #[must_use]
    pub fn next_object(&self, id: ObjectId) -> ObjectId {
        if id.is_null() {
            return ObjectId::NULL;
        }
        self.objects
            .iter_alive()
            .find(|(other, _)| other.index() > id.index())
            .map_or(ObjectId::NULL, |(other, _)| other)
    }

    /// Iterates over live objects in index order.
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter_alive().map(|(id, _)| id)
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Names an object. An empty name removes the current one.
    pub fn set_name(&mut self, id: ObjectId, name: &str) {
        let Some(current) = self.objects.get(id).map(|r| r.name_index) else {
            return;
        };

        match (current, name.is_empty()) {
            (Some(index), true) => self.release_name(index),
            (Some(index), false) => self.names.rename(index, name),
            (None, true) => {}
            (None, false) => {
                let index = self.names.push(id, name);
                if let Some(record) = self.objects.get_mut(id) {
                    record.name_index = Some(index);
                }
            }
        }
    }

    /// The object's name, or "" if unnamed or not alive.
    #[must_use]
    pub fn name(&self, id: ObjectId) -> &str {
        self.objects
            .get(id)
            .and_then(|r| r.name_index)
            .and_then(|index| self.names.get(index))
            .map_or("", NameRecord::name)
    }

    /// Finds an object called `name`.
    ///
    /// With a live `parent`, only its direct children are searched.
    /// Otherwise only parentless objects are.
    #[must_use]
    pub fn find_by_name(&self, parent: ObjectId, name: &str) -> ObjectId {
        if self.has_object(parent) {
            return self
                .children(parent)
                .find(|child| self.name(*child) == name)
                .unwrap_or(ObjectId::NULL);
        }

        self.names
            .records()
            .iter()
            .filter(|record| record.name() == name)
            .map(NameRecord::object)
            .find(|object| self.parent(*object).is_null())
            .unwrap_or(ObjectId::NULL)
    }

    fn release_name(&mut self, index: u32) {
        let Some(owner) = self.names.get(index).map(NameRecord::object) else {
            return;
        };
        let moved = self.names.swap_remove(index);

        if let Some(record) = self.objects.get_mut(owner) {
            record.name_index = None;
        }
        if let Some(record) = moved.and_then(|m| self.objects.get_mut(m)) {
            record.name_index = Some(index);
        }
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Registers `owner` as the owner of `component_type`.
    ///
    /// A later registration for the same type replaces this one.
    pub fn register_component_type(&mut self, component_type: ComponentType, owner: OwnerRef) {
        tracing::debug!("Component type {} registered", component_type);
        self.component_types.register(component_type, owner);
    }

    /// Shorthand for registering a module value that is not shared yet.
    ///
    /// Returns the shared reference so the caller can keep using it.
    pub fn register_owner<O>(&mut self, component_type: ComponentType, owner: O) -> OwnerRef
    where
        O: ComponentOwner + 'static,
    {
        let owner: OwnerRef = std::sync::Arc::new(parking_lot::Mutex::new(owner));
        self.register_component_type(component_type, std::sync::Arc::clone(&owner));
        owner
    }

    /// The owner registered for `component_type`.
    #[must_use]
    pub fn component_owner(&self, component_type: ComponentType) -> Option<OwnerRef> {
        self.component_types.owner(component_type).cloned()
    }

    /// Asks the owner of `component_type` to create a component on `id`.
    ///
    /// Returns None if the object is not alive, the type has no owner, or
    /// the owner did not report the component with [`Self::add_component`].
    pub fn create_component(&mut self, id: ObjectId, component_type: ComponentType) -> Option<ComponentUid> {
        if !self.has_object(id) {
            return None;
        }
        let owner = self.component_owner(component_type)?;
        let handle = owner.lock().create_component(self, id, component_type);
        if !self.has_component(id, component_type) {
            tracing::warn!(
                "Owner of component type {} created nothing on object {}",
                component_type,
                id
            );
            return None;
        }
        Some(ComponentUid {
            object: id,
            component_type,
            owner: Some(owner),
            handle,
        })
    }

    /// Records that a component of `component_type` is attached to `id`.
    ///
    /// Called by the owner after creating its data.
    ///
    /// # Panics
    ///
    /// Panics if the component was already attached.
    pub fn add_component(&mut self, id: ObjectId, component_type: ComponentType, handle: ComponentHandle) {
        let Some(record) = self.objects.get_mut(id) else {
            tracing::warn!("Component type {} added to dead object {}", component_type, id);
            return;
        };
        let bit = component_type.bit();
        assert!(
            record.component_mask & bit == 0,
            "component type {component_type} added twice to object {id}"
        );
        record.component_mask |= bit;

        let uid = ComponentUid {
            object: id,
            component_type,
            owner: self.component_owner(component_type),
            handle,
        };
        self.events.emit(&RegistryEvent::ComponentAdded(uid));
    }

    /// Records that the component of `component_type` on `id` is gone.
    ///
    /// Called by the owner when it destroys its data.
    ///
    /// # Panics
    ///
    /// Panics if the component was not attached.
    pub fn destroy_component(&mut self, id: ObjectId, component_type: ComponentType, handle: ComponentHandle) {
        let Some(record) = self.objects.get_mut(id) else {
            tracing::warn!("Component type {} destroyed on dead object {}", component_type, id);
            return;
        };
        let bit = component_type.bit();
        assert!(
            record.component_mask & bit != 0,
            "component type {component_type} destroyed twice on object {id}"
        );
        record.component_mask &= !bit;

        let uid = ComponentUid {
            object: id,
            component_type,
            owner: self.component_owner(component_type),
            handle,
        };
        self.events.emit(&RegistryEvent::ComponentDestroyed(uid));
    }

    /// The raw component mask of `id`. Zero if not alive.
    #[inline]
    #[must_use]
    pub fn component_mask(&self, id: ObjectId) -> u64 {
        self.objects.get(id).map_or(0, |r| r.component_mask)
    }

    /// Checks if a component of `component_type` is attached to `id`.
    #[inline]
    #[must_use]
    pub fn has_component(&self, id: ObjectId, component_type: ComponentType) -> bool {
        self.component_mask(id) & component_type.bit() != 0
    }

    /// Looks up the component of `component_type` on `id`.
    ///
    /// Returns [`ComponentUid::INVALID`] if it is not attached. A bit set
    /// for a type with no registered owner yields a uid without owner and
    /// with [`ComponentHandle::INVALID`].
    #[must_use]
    pub fn component(&self, id: ObjectId, component_type: ComponentType) -> ComponentUid {
        if !self.has_component(id, component_type) {
            return ComponentUid::INVALID;
        }
        let owner = self.component_owner(component_type);
        let handle = owner.as_ref().map_or(ComponentHandle::INVALID, |owner| {
            owner.lock().resolve_component(id, component_type)
        });
        ComponentUid {
            object: id,
            component_type,
            owner,
            handle,
        }
    }

    /// The attached component with the lowest type id.
    #[must_use]
    pub fn first_component(&self, id: ObjectId) -> ComponentUid {
        self.component_from(id, 0)
    }

    /// The attached component following `uid` in type id order.
    #[must_use]
    pub fn next_component(&self, uid: &ComponentUid) -> ComponentUid {
        if !uid.is_valid() {
            return ComponentUid::INVALID;
        }
        self.component_from(uid.object, uid.component_type.index() + 1)
    }

    fn component_from(&self, id: ObjectId, start: usize) -> ComponentUid {
        if start >= MAX_COMPONENT_TYPES {
            return ComponentUid::INVALID;
        }
        let remaining = self.component_mask(id) & (u64::MAX << start);
        if remaining == 0 {
            return ComponentUid::INVALID;
        }
        self.component(id, ComponentType::new(remaining.trailing_zeros() as u8))
    }

    /// Iterates over the components of `id` in ascending type id order.
    pub fn components(&self, id: ObjectId) -> impl Iterator<Item = ComponentUid> + '_ {
        let first = self.first_component(id);
        std::iter::successors(first.is_valid().then_some(first), move |uid| {
            let next = self.next_component(uid);
            next.is_valid().then_some(next)
        })
    }
}
