//! # Engine Context
//!
//! Owns the one registry an engine instance works on and coordinates
//! full snapshots: the registry tables plus every component owner's
//! payload.
//!
//! ## Snapshot envelope
//!
//! ```text
//! b"ARBR" | u32 version | registry tables
//! (u8 type id | u32 count | (u32 object | owner payload) × count) × types
//! u8 0xFF
//! ```

use crate::config::RegistryConfig;
use crate::ecs::{ComponentType, ObjectId, Registry};
use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{PackedSlot, SnapshotReader, SnapshotWriter};

/// Snapshot magic bytes.
pub const MAGIC: [u8; 4] = *b"ARBR";

/// Newest snapshot format this build writes and reads.
pub const FORMAT_VERSION: u32 = 1;

/// Terminates the component payload sections.
const END_OF_SECTIONS: u8 = 0xFF;

/// An engine instance's registry and its snapshot coordinator.
#[derive(Debug, Default)]
pub struct EngineContext {
    registry: Registry,
}

impl EngineContext {
    /// Creates a context with an empty registry.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            registry: Registry::with_config(config),
        }
    }

    /// The registry.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The registry, mutably.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Consumes the context and returns its registry.
    #[must_use]
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Writes a full snapshot.
    #[must_use]
    pub fn save_snapshot(&self) -> Vec<u8> {
        let mut writer = SnapshotWriter::with_capacity(
            64 + self.registry.object_table().len() * std::mem::size_of::<PackedSlot>(),
        );
        writer.write_bytes(&MAGIC);
        writer.write_u32(FORMAT_VERSION);
        self.registry.serialize(&mut writer);

        for (component_type, owner) in self.registry.component_types.iter() {
            let holders: Vec<ObjectId> = self
                .registry
                .objects()
                .filter(|id| self.registry.has_component(*id, component_type))
                .collect();

            writer.write_u8(component_type.id());
            writer.write_u32(holders.len() as u32);
            let owner = owner.lock();
            for object in holders {
                writer.write_u32(object.index());
                owner.serialize_component(&mut writer, object, component_type);
            }
        }
        writer.write_u8(END_OF_SECTIONS);

        tracing::debug!("Snapshot saved: {} bytes", writer.len());
        writer.into_inner()
    }

    /// Replaces the registry contents and every owner's components with
    /// a snapshot written by [`Self::save_snapshot`].
    ///
    /// Owners must be registered before loading.
    ///
    /// # Errors
    ///
    /// Returns error on bad magic, an unsupported version, truncated or
    /// inconsistent data, or a payload section for a type with no owner.
    pub fn load_snapshot(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let mut reader = SnapshotReader::new(bytes);

        let mut magic = [0; 4];
        magic.copy_from_slice(reader.read_bytes(4)?);
        if magic != MAGIC {
            return Err(SnapshotError::BadMagic(magic));
        }
        let version = reader.read_u32()?;
        if version == 0 || version > FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        self.registry.deserialize(&mut reader)?;

        loop {
            let id = reader.read_u8()?;
            if id == END_OF_SECTIONS {
                break;
            }
            self.load_section(&mut reader, id, version)?;
        }

        if reader.remaining() != 0 {
            return Err(SnapshotError::InvalidRecord(format!(
                "{} trailing bytes after the last section",
                reader.remaining()
            )));
        }

        tracing::debug!("Snapshot loaded: {} bytes, version {}", bytes.len(), version);
        Ok(())
    }

    fn load_section(
        &mut self,
        reader: &mut SnapshotReader<'_>,
        id: u8,
        version: u32,
    ) -> SnapshotResult<()> {
        let component_type =
            ComponentType::try_new(id).ok_or(SnapshotError::UnknownComponentType(id))?;
        let owner = self
            .registry
            .component_owner(component_type)
            .ok_or(SnapshotError::UnknownComponentType(id))?;

        let count = reader.read_u32()?;
        let mut owner = owner.lock();
        for _ in 0..count {
            let object = ObjectId::new(reader.read_u32()?);
            if !self.registry.has_component(object, component_type) {
                return Err(SnapshotError::InvalidRecord(format!(
                    "object {object} has a payload for component type {component_type} it does not carry"
                )));
            }
            owner.deserialize_component(reader, object, component_type, version)?;
        }
        Ok(())
    }
}
