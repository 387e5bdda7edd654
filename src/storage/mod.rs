//! Storage capabilities the engine depends on, and the reference backends.
//!
//! - [`StateStorage`] reads and writes the current state name of an entity.
//! - [`LockableStorage`] adds an exclusive advisory lock per entity.
//! - [`MemoryStorage`] keeps everything in process memory; its lock blocks.
//! - [`SharedStorage`] keeps everything in a network key-value store; its
//!   lock fails fast and expires on its own after a TTL.

mod guard;
pub mod memory;
pub mod shared;

use std::sync::Arc;
use thiserror::Error;

pub use guard::LockGuard;
pub use memory::MemoryStorage;
pub use shared::{KeyValueStore, LocalKeyValueStore, SharedStorage, SharedStorageConfig};

#[cfg(feature = "redis")]
pub use shared::RedisStore;

/// Errors reported by storage backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("state not found for entity '{entity_id}'")]
    NotFound { entity_id: String },

    #[error("unable to acquire lock for entity '{entity_id}'")]
    LockHeld { entity_id: String },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn backend(error: impl std::fmt::Display) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Durable `entity_id -> state name` mapping.
pub trait StateStorage: Send + Sync {
    /// Current state name. Errors when no record exists.
    fn get_state(&self, entity_id: &str) -> Result<String, StorageError>;

    /// Create or overwrite the record.
    fn set_state(&self, entity_id: &str, state: &str) -> Result<(), StorageError>;
}

/// State storage that can also hand out an exclusive lock per entity.
pub trait LockableStorage: StateStorage {
    /// Acquire the lock for `entity_id`.
    ///
    /// The lock is held until the returned guard is released or dropped.
    /// Whether contention blocks or fails is up to the backend.
    fn lock(&self, entity_id: &str) -> Result<LockGuard, StorageError>;
}

impl<T: StateStorage + ?Sized> StateStorage for Arc<T> {
    fn get_state(&self, entity_id: &str) -> Result<String, StorageError> {
        (**self).get_state(entity_id)
    }

    fn set_state(&self, entity_id: &str, state: &str) -> Result<(), StorageError> {
        (**self).set_state(entity_id, state)
    }
}

impl<T: LockableStorage + ?Sized> LockableStorage for Arc<T> {
    fn lock(&self, entity_id: &str) -> Result<LockGuard, StorageError> {
        (**self).lock(entity_id)
    }
}
