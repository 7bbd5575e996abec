//! Application state: a single process-wide [`accounts_engine::Store`]
//! behind a reader/writer lock (single-writer / multi-reader).

use std::sync::{Arc, RwLock};

use accounts_engine::Store;

/// Shared handle to the engine's store, cloned into every axum handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
}

impl AppState {
    /// Wraps an already-seeded store for sharing across handlers.
    #[must_use]
    pub fn new(store: Store) -> Self {
        AppState {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Acquires the shared (read) lock for a query executor.
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().expect("store lock poisoned")
    }

    /// Acquires the exclusive (write) lock for a mutator.
    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().expect("store lock poisoned")
    }
}
