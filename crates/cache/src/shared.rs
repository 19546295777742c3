//! Shared cache handles

use crate::cache::RowCache;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle over a single underlying cache.
///
/// All holders see the same row arena and cursor; the lock serializes their
/// reads and writes. For an independent view use `create_copy` instead.
#[derive(Clone)]
pub struct SharedRowCache {
    inner: Arc<Mutex<RowCache>>,
}

impl SharedRowCache {
    pub fn new(cache: RowCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Run `f` with exclusive access to the cache
    pub fn with<R>(&self, f: impl FnOnce(&mut RowCache) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Deep copy of the current cache state, independent of this handle
    pub fn create_copy(&self) -> RowCache {
        self.inner.lock().create_copy()
    }
}
