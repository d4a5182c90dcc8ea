//! # Registry Snapshots
//!
//! Binary image of the structural tables, in fixed order:
//!
//! ```text
//! u32 slot count   | PackedSlot × count
//! u32 name count   | (u32 object, u32 len, utf-8 bytes) × count
//! u32 free-list head
//! u32 node count   | PackedNode × count
//! ```
//!
//! Loading rebuilds every object at its exact index, so ids held by
//! component owners stay valid. The free list is walked and rejected
//! unless it links every dead slot exactly once. Hierarchy links are
//! trusted as stored; use [`Registry::check_hierarchy`] on untrusted input.

mod codec;
mod records;

pub use codec::{SnapshotReader, SnapshotWriter};
pub use records::{PackedNode, PackedSlot, NO_NODE};

use crate::ecs::{ObjectId, Registry};
use crate::error::{SnapshotError, SnapshotResult};

/// Reads a record count and checks the stream can hold that many records.
fn read_count(reader: &mut SnapshotReader<'_>, record_size: usize) -> SnapshotResult<usize> {
    let count = reader.read_u32()? as usize;
    let needed = count.saturating_mul(record_size);
    if needed > reader.remaining() {
        return Err(SnapshotError::UnexpectedEof {
            needed,
            remaining: reader.remaining(),
        });
    }
    Ok(count)
}

impl Registry {
    /// Writes the object, name and hierarchy tables.
    ///
    /// Component payloads are not included; see [`crate::EngineContext`].
    pub fn serialize(&self, writer: &mut SnapshotWriter) {
        let start = writer.len();

        writer.write_u32(self.objects.len() as u32);
        for slot in self.objects.slots() {
            writer.write_pod(&PackedSlot::pack(slot));
        }

        writer.write_u32(self.names.len() as u32);
        for record in self.names.records() {
            writer.write_u32(record.object().index());
            writer.write_str(record.name());
        }

        writer.write_u32(self.objects.first_free().index());

        writer.write_u32(self.hierarchy.len() as u32);
        for node in self.hierarchy.nodes() {
            writer.write_pod(&PackedNode::pack(node));
        }

        tracing::debug!(
            "Registry saved: {} slots, {} names, {} nodes, {} bytes",
            self.objects.len(),
            self.names.len(),
            self.hierarchy.len(),
            writer.len() - start
        );
    }

    /// Replaces the tables with ones read from `reader`.
    ///
    /// Registered component types and listeners are kept. No events fire.
    ///
    /// # Errors
    ///
    /// Returns error if the stream is truncated or a record points at
    /// something that does not exist. The registry is left empty.
    pub fn deserialize(&mut self, reader: &mut SnapshotReader<'_>) -> SnapshotResult<()> {
        let start = reader.position();
        self.clear_tables();

        if let Err(err) = self.read_tables(reader) {
            self.clear_tables();
            return Err(err);
        }

        tracing::debug!(
            "Registry loaded: {} objects, {} names, {} nodes, {} bytes",
            self.objects.alive_count(),
            self.names.len(),
            self.hierarchy.len(),
            reader.position() - start
        );
        Ok(())
    }

    fn clear_tables(&mut self) {
        self.objects.clear();
        self.names.clear();
        self.hierarchy.clear();
    }

    fn read_tables(&mut self, reader: &mut SnapshotReader<'_>) -> SnapshotResult<()> {
        let slot_count = read_count(reader, std::mem::size_of::<PackedSlot>())?;
        for index in 0..slot_count {
            let packed: PackedSlot = reader.read_pod()?;
            let id = ObjectId::new(index as u32);
            if packed.is_alive() {
                self.objects.emplace(id);
                if let Some(record) = self.objects.get_mut(id) {
                    *record = packed.record();
                }
            } else {
                self.objects.push_raw_free(packed.link());
            }
        }

        let name_count = read_count(reader, 8)?;
        for _ in 0..name_count {
            let object = ObjectId::new(reader.read_u32()?);
            let name = reader.read_str()?;
            let Some(record) = self.objects.get(object) else {
                return Err(SnapshotError::InvalidRecord(format!(
                    "name '{name}' belongs to dead object {object}"
                )));
            };
            if record.name_index.is_some() {
                return Err(SnapshotError::InvalidRecord(format!(
                    "object {object} is named twice"
                )));
            }
            let index = self.names.push(object, name);
            if let Some(record) = self.objects.get_mut(object) {
                record.name_index = Some(index);
            }
        }

        let first_free = ObjectId::new(reader.read_u32()?);
        self.objects.set_first_free(first_free);
        self.objects
            .check_free_list()
            .map_err(SnapshotError::InvalidRecord)?;

        let node_count = read_count(reader, std::mem::size_of::<PackedNode>())?;
        for _ in 0..node_count {
            let packed: PackedNode = reader.read_pod()?;
            self.hierarchy.push(packed.node());
        }

        for (id, record) in self.objects.iter_alive() {
            let Some(index) = record.hierarchy_index else {
                continue;
            };
            if self.hierarchy.get(index).map(|node| node.object) != Some(id) {
                return Err(SnapshotError::InvalidRecord(format!(
                    "object {id} points at hierarchy node {index} it does not own"
                )));
            }
        }
        Ok(())
    }
}
