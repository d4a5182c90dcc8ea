//! # Shared Registry Access
//!
//! The registry itself has no internal locking: every mutation takes
//! `&mut Registry`. When other threads need to read it, wrap it here.
//!
//! ```text
//! Owner thread:   write() ── mutate ── drop ── write() ── ...
//! Reader threads:            read() ── traverse ── drop
//! ```
//!
//! Many readers or one writer, never both.

mod shared;

pub use shared::{RegistryReadGuard, RegistryWriteGuard, SharedRegistry};
