//! # Object Table
//!
//! Objects are plain indices into a dense slot array. Every slot is either
//! a live record or a link in the doubly linked free list of dead slots:
//! - Creation pops the free-list head, or appends when the list is empty
//! - Destruction pushes the slot back onto the head
//! - Both are O(1)

use std::fmt;

use arbor_shared::{Quaternion, Transform, Vec3};

/// Handle identifying one object.
///
/// The handle is the slot index. It is valid while the slot is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Null/invalid object ID.
    pub const NULL: Self = Self(u32::MAX);

    /// Creates an object ID from a slot index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Checks if this object ID is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("#null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Per-object data for a live slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectRecord {
    /// World transform.
    pub transform: Transform,
    /// Index into the hierarchy table, if the object has a node.
    pub hierarchy_index: Option<u32>,
    /// Index into the name table, if the object is named.
    pub name_index: Option<u32>,
    /// Bitmask of attached component types (up to 64).
    pub component_mask: u64,
}

impl ObjectRecord {
    /// Creates a record with no components, name or hierarchy node.
    #[inline]
    #[must_use]
    pub const fn new(transform: Transform) -> Self {
        Self {
            transform,
            hierarchy_index: None,
            name_index: None,
            component_mask: 0,
        }
    }
}

impl Default for ObjectRecord {
    fn default() -> Self {
        Self::new(Transform::IDENTITY)
    }
}

/// Free-list neighbours of a dead slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeLink {
    /// Previous dead slot, or null at the head.
    pub prev: ObjectId,
    /// Next dead slot, or null at the tail.
    pub next: ObjectId,
}

/// One entry of the object table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slot {
    /// The slot holds a live object.
    Live(ObjectRecord),
    /// The slot is dead and linked into the free list.
    Free(FreeLink),
}

impl Slot {
    /// Checks if the slot holds a live object.
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

/// Dense slot array with free-list recycling.
#[derive(Debug, Default)]
pub struct ObjectTable {
    slots: Vec<Slot>,
    first_free: ObjectId,
    alive_count: usize,
}

impl ObjectTable {
    /// Creates an empty table with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            first_free: ObjectId::NULL,
            alive_count: 0,
        }
    }

    /// Number of slots, live or dead.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the table has no slots at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of live objects.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Head of the free list.
    #[inline]
    #[must_use]
    pub const fn first_free(&self) -> ObjectId {
        self.first_free
    }

    /// All slots in index order.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Checks if `id` names a live slot.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Gets a live record.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&ObjectRecord> {
        match self.slots.get(id.slot()) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }

    /// Gets a live record mutably.
    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        match self.slots.get_mut(id.slot()) {
            Some(Slot::Live(record)) => Some(record),
            _ => None,
        }
    }

    fn link_mut(&mut self, id: ObjectId) -> Option<&mut FreeLink> {
        match self.slots.get_mut(id.slot()) {
            Some(Slot::Free(link)) => Some(link),
            _ => None,
        }
    }

    /// Stores `record` in a recycled slot, or a new one if none is free.
    pub fn allocate(&mut self, record: ObjectRecord) -> ObjectId {
        self.alive_count += 1;

        if self.first_free.is_null() {
            let id = ObjectId::new(self.slots.len() as u32);
            self.slots.push(Slot::Live(record));
            return id;
        }

        let id = self.first_free;
        self.unlink(id);
        self.slots[id.slot()] = Slot::Live(record);
        id
    }

    /// Kills a live slot and pushes it onto the free-list head.
    ///
    /// Returns the record that lived there, or None if it was already dead.
    pub fn release(&mut self, id: ObjectId) -> Option<ObjectRecord> {
        let record = *self.get(id)?;
        self.push_free_head(id);
        self.alive_count -= 1;
        Some(record)
    }

    /// Forces slot `id` to exist and be alive with a default record.
    ///
    /// Slots added to reach `id` go onto the free list. Returns false if
    /// the slot was already alive.
    pub fn emplace(&mut self, id: ObjectId) -> bool {
        if id.is_null() || self.is_alive(id) {
            return false;
        }

        while self.slots.len() <= id.slot() {
            let index = ObjectId::new(self.slots.len() as u32);
            self.slots.push(Slot::Free(FreeLink::default()));
            self.push_free_head(index);
        }

        self.unlink(id);
        self.slots[id.slot()] = Slot::Live(ObjectRecord::default());
        self.alive_count += 1;
        true
    }

    fn push_free_head(&mut self, id: ObjectId) {
        let old_head = self.first_free;
        self.slots[id.slot()] = Slot::Free(FreeLink {
            prev: ObjectId::NULL,
            next: old_head,
        });
        if let Some(link) = self.link_mut(old_head) {
            link.prev = id;
        }
        self.first_free = id;
    }

    /// Removes a dead slot from the free list.
    fn unlink(&mut self, id: ObjectId) {
        let Some(&mut FreeLink { prev, next }) = self.link_mut(id) else {
            return;
        };

        match self.link_mut(prev) {
            Some(link) => link.next = next,
            None => self.first_free = next,
        }
        if let Some(link) = self.link_mut(next) {
            link.prev = prev;
        }
    }

    /// Drops every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.first_free = ObjectId::NULL;
        self.alive_count = 0;
    }

    /// Appends a dead slot with the given links, without touching the head.
    ///
    /// Used when rebuilding a table from a snapshot.
    pub(crate) fn push_raw_free(&mut self, link: FreeLink) {
        self.slots.push(Slot::Free(link));
    }

    pub(crate) fn set_first_free(&mut self, id: ObjectId) {
        self.first_free = id;
    }

    /// Walks the free list and checks that it links every dead slot once.
    ///
    /// Each link must name a dead slot whose `prev` points back at the
    /// slot before it, and the walk must visit exactly the dead slots.
    pub fn check_free_list(&self) -> Result<(), String> {
        let dead = self.slots.len() - self.alive_count;
        let mut prev = ObjectId::NULL;
        let mut cursor = self.first_free;
        let mut visited = 0;

        while !cursor.is_null() {
            if visited == dead {
                return Err(format!("free list revisits slot {cursor}"));
            }
            let Some(Slot::Free(link)) = self.slots.get(cursor.slot()) else {
                return Err(format!("free list links {cursor}, which is not a dead slot"));
            };
            if link.prev != prev {
                return Err(format!(
                    "free slot {cursor} links back to {} instead of {prev}",
                    link.prev
                ));
            }
            prev = cursor;
            cursor = link.next;
            visited += 1;
        }

        if visited != dead {
            return Err(format!("free list reaches {visited} of {dead} dead slots"));
        }
        Ok(())
    }

    /// Iterates over live objects in index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = (ObjectId, &ObjectRecord)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Live(record) => Some((ObjectId::new(index as u32), record)),
            Slot::Free(_) => None,
        })
    }

    /// Walks the free list from the head.
    pub fn iter_free(&self) -> impl Iterator<Item = ObjectId> + '_ {
        let mut cursor = self.first_free;
        let mut steps = 0;
        std::iter::from_fn(move || {
            // a corrupt list must not spin forever
            if steps > self.slots.len() {
                return None;
            }
            let current = cursor;
            match self.slots.get(current.slot()) {
                Some(Slot::Free(link)) => {
                    cursor = link.next;
                    steps += 1;
                    Some(current)
                }
                _ => None,
            }
        })
    }
}

/// Builds a world transform at `position` facing `rotation` with unit scale.
#[inline]
#[must_use]
pub fn placement(position: Vec3, rotation: Quaternion) -> Transform {
    Transform::new(position, rotation, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(n: usize) -> (ObjectTable, Vec<ObjectId>) {
        let mut table = ObjectTable::with_capacity(n);
        let ids = (0..n).map(|_| table.allocate(ObjectRecord::default())).collect();
        (table, ids)
    }

    #[test]
    fn test_object_id_null() {
        assert!(ObjectId::NULL.is_null());
        assert!(ObjectId::default().is_null());
        assert!(!ObjectId::new(0).is_null());
        assert_eq!(ObjectId::new(7).to_string(), "#7");
    }

    #[test]
    fn test_allocate_appends_then_reuses() {
        let (mut table, ids) = table_with(3);
        assert_eq!(ids, vec![ObjectId::new(0), ObjectId::new(1), ObjectId::new(2)]);

        assert!(table.release(ids[1]).is_some());
        assert!(!table.is_alive(ids[1]));
        assert_eq!(table.first_free(), ids[1]);

        let reused = table.allocate(ObjectRecord::default());
        assert_eq!(reused, ids[1]);
        assert!(table.first_free().is_null());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_release_twice_is_noop() {
        let (mut table, ids) = table_with(2);
        assert!(table.release(ids[0]).is_some());
        assert!(table.release(ids[0]).is_none());
        assert_eq!(table.alive_count(), 1);
        assert_eq!(table.iter_free().count(), 1);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let (mut table, ids) = table_with(4);
        table.release(ids[0]);
        table.release(ids[2]);
        table.release(ids[3]);

        let free: Vec<_> = table.iter_free().collect();
        assert_eq!(free, vec![ids[3], ids[2], ids[0]]);
    }

    #[test]
    fn test_emplace_grows_and_links_gap() {
        let mut table = ObjectTable::default();
        assert!(table.emplace(ObjectId::new(3)));

        assert_eq!(table.len(), 4);
        assert!(table.is_alive(ObjectId::new(3)));
        assert_eq!(table.alive_count(), 1);

        let mut free: Vec<_> = table.iter_free().collect();
        free.sort();
        assert_eq!(free, vec![ObjectId::new(0), ObjectId::new(1), ObjectId::new(2)]);
    }

    #[test]
    fn test_check_free_list_accepts_built_tables() {
        let (mut table, ids) = table_with(5);
        assert_eq!(table.check_free_list(), Ok(()));
        table.release(ids[3]);
        table.release(ids[0]);
        assert!(table.emplace(ObjectId::new(8)));
        assert_eq!(table.check_free_list(), Ok(()));
    }

    #[test]
    fn test_check_free_list_rejects_bad_links() {
        // slot 1 dead but its next points out of range
        let mut table = ObjectTable::default();
        table.emplace(ObjectId::new(0));
        table.push_raw_free(FreeLink {
            prev: ObjectId::NULL,
            next: ObjectId::new(1000),
        });
        table.set_first_free(ObjectId::new(1));
        assert!(table.check_free_list().is_err());

        // next points at a live slot
        let mut table = ObjectTable::default();
        table.emplace(ObjectId::new(0));
        table.push_raw_free(FreeLink {
            prev: ObjectId::NULL,
            next: ObjectId::new(0),
        });
        table.set_first_free(ObjectId::new(1));
        assert!(table.check_free_list().is_err());

        // self loop
        let mut table = ObjectTable::default();
        table.push_raw_free(FreeLink {
            prev: ObjectId::NULL,
            next: ObjectId::new(0),
        });
        table.set_first_free(ObjectId::new(0));
        assert!(table.check_free_list().is_err());
    }

    #[test]
    fn test_check_free_list_rejects_unreached_or_mislinked_slots() {
        // two dead slots, the head ends the list early
        let mut table = ObjectTable::default();
        table.push_raw_free(FreeLink::default());
        table.push_raw_free(FreeLink::default());
        table.set_first_free(ObjectId::new(0));
        assert!(table.check_free_list().is_err());

        // 0 -> 1, but 1 claims a different predecessor
        let mut table = ObjectTable::default();
        table.push_raw_free(FreeLink {
            prev: ObjectId::NULL,
            next: ObjectId::new(1),
        });
        table.push_raw_free(FreeLink {
            prev: ObjectId::new(5),
            next: ObjectId::NULL,
        });
        table.set_first_free(ObjectId::new(0));
        assert!(table.check_free_list().is_err());
    }

    #[test]
    fn test_emplace_unlinks_middle_of_free_list() {
        let (mut table, ids) = table_with(3);
        for id in &ids {
            table.release(*id);
        }
        // list is 2 -> 1 -> 0
        assert!(table.emplace(ids[1]));
        assert!(!table.emplace(ids[1]));

        let free: Vec<_> = table.iter_free().collect();
        assert_eq!(free, vec![ids[2], ids[0]]);
        match table.slots()[ids[0].slot()] {
            Slot::Free(link) => assert_eq!(link.prev, ids[2]),
            Slot::Live(_) => panic!("slot 0 should be free"),
        }
    }
}
