//! Reader/writer handle around a [`Registry`].

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ecs::Registry;

/// Shared read access to the registry.
pub type RegistryReadGuard<'a> = RwLockReadGuard<'a, Registry>;

/// Exclusive write access to the registry.
pub type RegistryWriteGuard<'a> = RwLockWriteGuard<'a, Registry>;

/// Cloneable handle to one registry shared between threads.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Wraps `registry`.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Blocks until no writer holds the registry.
    #[must_use]
    pub fn read(&self) -> RegistryReadGuard<'_> {
        self.inner.read()
    }

    /// Blocks until no reader or writer holds the registry.
    #[must_use]
    pub fn write(&self) -> RegistryWriteGuard<'_> {
        self.inner.write()
    }

    /// Write access without blocking, or None while the registry is held.
    #[must_use]
    pub fn try_write(&self) -> Option<RegistryWriteGuard<'_>> {
        self.inner.try_write()
    }

    /// Unwraps the registry if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns the handle back if other clones are still alive.
    pub fn into_inner(self) -> Result<Registry, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_shared::{Quaternion, Vec3};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_handle_is_send_sync() {
        assert_send_sync::<SharedRegistry>();
    }

    #[test]
    fn test_parallel_readers() {
        let shared = SharedRegistry::new(Registry::new());
        {
            let mut registry = shared.write();
            for i in 0..100 {
                registry.create_object(Vec3::new(i as f32, 0.0, 0.0), Quaternion::IDENTITY);
            }
        }

        let totals: Vec<f32> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let shared = shared.clone();
                    scope.spawn(move || {
                        let registry = shared.read();
                        registry.objects().map(|id| registry.position(id).x).sum::<f32>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(totals.iter().all(|total| (*total - 4950.0).abs() < 1e-3));
    }

    #[test]
    fn test_writer_excludes_readers() {
        let shared = SharedRegistry::new(Registry::new());
        let reader = shared.read();
        assert!(shared.try_write().is_none());
        drop(reader);
        assert!(shared.try_write().is_some());
    }

    #[test]
    fn test_into_inner() {
        let shared = SharedRegistry::new(Registry::new());
        let other = shared.clone();
        let shared = shared.into_inner().unwrap_err();
        drop(other);
        assert!(shared.into_inner().is_ok());
    }
}
