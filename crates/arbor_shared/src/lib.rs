//! # ARBOR Shared
//!
//! Math types used by the registry and by every module that attaches
//! components to registry objects.
//!
//! ## RULE
//!
//! This crate must stay plain data. Anything that needs to know about
//! objects, hierarchy or components belongs in `arbor_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;

pub use math::{Quaternion, Transform, Vec3, EPSILON};
