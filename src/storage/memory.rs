//! In-process storage backend.
//!
//! Only meaningful when every caller that can touch an entity lives in the
//! same process. Lock contention is resolved by blocking, never by failing.

use super::{LockGuard, LockableStorage, StateStorage, StorageError};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-entity exclusive lock. `held` is only touched under its own mutex.
#[derive(Default)]
struct EntityLock {
    held: Mutex<bool>,
    freed: Condvar,
}

impl EntityLock {
    fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.freed.wait(&mut held);
        }
        *held = true;
    }

    fn release(&self) {
        *self.held.lock() = false;
        self.freed.notify_one();
    }
}

/// State records and locks kept in process memory.
///
/// # Example
///
/// ```rust
/// use lockstep::storage::{LockableStorage, MemoryStorage, StateStorage};
///
/// let storage = MemoryStorage::new();
/// storage.set_state("scan-1", "pending").unwrap();
///
/// let guard = storage.lock("scan-1").unwrap();
/// assert_eq!(storage.get_state("scan-1").unwrap(), "pending");
/// guard.release();
/// ```
#[derive(Default)]
pub struct MemoryStorage {
    states: RwLock<HashMap<String, String>>,
    locks: Mutex<HashMap<String, Arc<EntityLock>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the storage with existing records.
    pub fn with_states<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let states = records
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            states: RwLock::new(states),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entities with a persisted state.
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    fn entity_lock(&self, entity_id: &str) -> Arc<EntityLock> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(entity_id.to_string()).or_default())
    }
}

impl StateStorage for MemoryStorage {
    fn get_state(&self, entity_id: &str) -> Result<String, StorageError> {
        self.states
            .read()
            .get(entity_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                entity_id: entity_id.to_string(),
            })
    }

    fn set_state(&self, entity_id: &str, state: &str) -> Result<(), StorageError> {
        self.states
            .write()
            .insert(entity_id.to_string(), state.to_string());
        Ok(())
    }
}

impl LockableStorage for MemoryStorage {
    fn lock(&self, entity_id: &str) -> Result<LockGuard, StorageError> {
        // The registry mutex is dropped before blocking on the entity lock,
        // so waiting on one entity never stalls lock creation for another.
        let lock = self.entity_lock(entity_id);
        lock.acquire();
        Ok(LockGuard::new(move || lock.release()))
    }
}
