//! Cache event listeners

use std::sync::Arc;

/// Callbacks fired as the cache changes. Default impls are no-ops so a
/// listener implements only what it cares about.
pub trait CacheListener: Send + Sync {
    /// Cursor moved to a different position
    fn cursor_moved(&self) {}

    /// A single row was committed, deleted, or had an edit undone
    fn row_changed(&self) {}

    /// The whole row set was replaced (population, restore, release)
    fn cache_replaced(&self) {}
}

/// Listener registry; identity-based removal
#[derive(Clone, Default)]
pub(crate) struct ListenerSet {
    listeners: Vec<Arc<dyn CacheListener>>,
}

impl ListenerSet {
    pub(crate) fn add(&mut self, listener: Arc<dyn CacheListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn remove(&mut self, listener: &Arc<dyn CacheListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub(crate) fn cursor_moved(&self) {
        for l in &self.listeners {
            l.cursor_moved();
        }
    }

    pub(crate) fn row_changed(&self) {
        for l in &self.listeners {
            l.row_changed();
        }
    }

    pub(crate) fn cache_replaced(&self) {
        for l in &self.listeners {
            l.cache_replaced();
        }
    }
}
