//! # Arbor Core
//!
//! Object registry with a transform hierarchy, designed for:
//! - Stable integer ids recycled through a free list
//! - World/local transform consistency under any mutation order
//! - Component dispatch to the modules that own the data
//! - Exact binary snapshots
//!
//! ## Architecture Rules
//!
//! 1. **One owner** - All mutation goes through `&mut Registry`
//! 2. **Dense tables** - Slots, names and hierarchy nodes are flat arrays
//! 3. **Sentinels over panics** - Queries on dead ids return null/identity
//!
//! ## Example
//!
//! ```rust,ignore
//! use arbor_core::{EngineContext, RegistryConfig};
//! use arbor_shared::{Quaternion, Vec3};
//!
//! let mut context = EngineContext::new(RegistryConfig::default());
//! let registry = context.registry_mut();
//! let ship = registry.create_object(Vec3::ZERO, Quaternion::IDENTITY);
//! let turret = registry.create_object(Vec3::new(0.0, 1.0, 0.0), Quaternion::IDENTITY);
//! registry.set_parent(ship, turret)?;
//!
//! let bytes = context.save_snapshot();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod ecs;
pub mod error;
pub mod snapshot;
pub mod sync;

pub use config::RegistryConfig;
pub use context::{EngineContext, FORMAT_VERSION, MAGIC};
pub use ecs::{
    ComponentHandle, ComponentOwner, ComponentType, ComponentUid, EventKind, ListenerId, ObjectId,
    OwnerRef, Registry, RegistryEvent, MAX_COMPONENT_TYPES, NAME_CAPACITY,
};
pub use error::{ConfigError, RegistryError, RegistryResult, SnapshotError, SnapshotResult};
pub use snapshot::{SnapshotReader, SnapshotWriter};
pub use sync::SharedRegistry;
