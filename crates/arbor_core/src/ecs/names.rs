//! # Name Table
//!
//! Sparse, optional object names. Records are packed densely; removal
//! swaps the last record into the hole so the owning object of the moved
//! record has to be repointed by the caller.

use bytemuck::{Pod, Zeroable};

use super::object::ObjectId;

/// Maximum name length in bytes. Longer names are truncated.
pub const NAME_CAPACITY: usize = 32;

/// A fixed-length name owned by one object.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct NameRecord {
    object: u32,
    len: u32,
    bytes: [u8; NAME_CAPACITY],
}

impl NameRecord {
    /// Creates a record, truncating `name` on a character boundary.
    #[must_use]
    pub fn new(object: ObjectId, name: &str) -> Self {
        let mut record = Self::zeroed();
        record.object = object.index();
        record.set(name);
        record
    }

    /// The owning object.
    #[inline]
    #[must_use]
    pub const fn object(&self) -> ObjectId {
        ObjectId::new(self.object)
    }

    /// The stored name.
    #[must_use]
    pub fn name(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    fn set(&mut self, name: &str) {
        let mut end = name.len().min(NAME_CAPACITY);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        if end < name.len() {
            tracing::warn!(
                "Name '{}' truncated to {} bytes for object {}",
                name,
                end,
                self.object()
            );
        }
        self.bytes = [0; NAME_CAPACITY];
        self.bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        self.len = end as u32;
    }
}

/// Densely packed name records.
#[derive(Debug, Default)]
pub struct NameTable {
    records: Vec<NameRecord>,
}

impl NameTable {
    /// Creates an empty table with room for `capacity` names.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Number of named objects.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no object is named.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in storage order.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    /// Gets a record by index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u32) -> Option<&NameRecord> {
        self.records.get(index as usize)
    }

    /// Appends a record and returns its index.
    pub fn push(&mut self, object: ObjectId, name: &str) -> u32 {
        let index = self.records.len() as u32;
        self.records.push(NameRecord::new(object, name));
        index
    }

    /// Overwrites the name stored at `index`.
    pub fn rename(&mut self, index: u32, name: &str) {
        if let Some(record) = self.records.get_mut(index as usize) {
            record.set(name);
        }
    }

    /// Removes the record at `index` by swapping the last record into it.
    ///
    /// Returns the object whose record moved into `index`, if any. That
    /// object's name index must be repointed to `index`.
    pub fn swap_remove(&mut self, index: u32) -> Option<ObjectId> {
        let index = index as usize;
        if index >= self.records.len() {
            return None;
        }
        self.records.swap_remove(index);
        self.records.get(index).map(NameRecord::object)
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_record_size() {
        assert_eq!(std::mem::size_of::<NameRecord>(), 8 + NAME_CAPACITY);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        // 31 ASCII bytes followed by a two-byte character
        let name = format!("{}é", "a".repeat(31));
        let record = NameRecord::new(ObjectId::new(0), &name);
        assert_eq!(record.name(), "a".repeat(31));
    }

    #[test]
    fn test_swap_remove_reports_moved_owner() {
        let mut table = NameTable::default();
        table.push(ObjectId::new(10), "first");
        table.push(ObjectId::new(11), "second");
        table.push(ObjectId::new(12), "third");

        assert_eq!(table.swap_remove(0), Some(ObjectId::new(12)));
        assert_eq!(table.get(0).map(NameRecord::name), Some("third"));

        // removing the last record moves nothing
        assert_eq!(table.swap_remove(1), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rename() {
        let mut table = NameTable::default();
        let index = table.push(ObjectId::new(1), "old");
        table.rename(index, "new");
        assert_eq!(table.get(index).map(NameRecord::name), Some("new"));
    }
}
