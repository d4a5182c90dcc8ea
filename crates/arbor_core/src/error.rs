//! # Registry Error Types
//!
//! All recoverable errors the registry can report.
//!
//! Contract violations (adding a component twice, destroying it twice,
//! an owner that does not clear its bit on destroy) are not errors. They
//! are assertion failures.

use thiserror::Error;

use crate::ecs::ObjectId;

/// Errors raised by structural registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Reparenting would make an object its own ancestor.
    #[error("hierarchy can not contain a cycle: {parent} is {child} or one of its descendants")]
    HierarchyCycle {
        /// The requested parent.
        parent: ObjectId,
        /// The object that was being reparented.
        child: ObjectId,
    },

    /// The object is not alive.
    #[error("object {0} is not alive")]
    DeadObject(ObjectId),

    /// Hierarchy data failed validation.
    #[error("corrupt hierarchy at object {object}: {reason}")]
    CorruptHierarchy {
        /// The object whose node failed validation.
        object: ObjectId,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised while reading a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The stream ended before a value could be read.
    #[error("unexpected end of snapshot: need {needed} bytes, have {remaining}")]
    UnexpectedEof {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// The envelope magic did not match.
    #[error("bad snapshot magic: {0:02x?}")]
    BadMagic([u8; 4]),

    /// The envelope version is newer than this build understands.
    #[error("unsupported snapshot version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version found in the stream.
        found: u32,
        /// Newest version this build can read.
        supported: u32,
    },

    /// A record referenced something that does not exist.
    #[error("invalid snapshot record: {0}")]
    InvalidRecord(String),

    /// A payload section named a component type without an owner.
    #[error("no owner registered for component type {0} in snapshot")]
    UnknownComponentType(u8),
}

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("failed to parse registry config: {0}")]
    Parse(String),

    /// A value was out of range.
    #[error("invalid registry config: {0}")]
    Invalid(String),
}
