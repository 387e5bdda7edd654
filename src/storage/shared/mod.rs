//! Storage backed by a network-shared key-value store.
//!
//! Key layout:
//! - state: `"<prefix>:<entity_id>"` holding the state name, no TTL unless
//!   [`SharedStorageConfig::state_ttl`] is set
//! - lock: `"<prefix>:lock:<entity_id>"` holding [`LOCK_MARKER`] with
//!   [`SharedStorageConfig::lock_ttl`]
//!
//! A lock that is never released expires with its key, so a crashed holder
//! blocks other processes for at most one lock TTL.
//!
//! A zero TTL means no expiry, for state and lock keys alike.

mod local;
#[cfg(feature = "redis")]
mod redis_store;

use super::{LockGuard, LockableStorage, StateStorage, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use local::LocalKeyValueStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

/// Value stored under a lock key.
pub const LOCK_MARKER: &str = "locked";

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "fsm";

/// Default lock time-to-live.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(10);

/// The handful of key-value operations the shared backend needs.
///
/// Implementations must make `set_if_absent` atomic across every client of
/// the store; that single operation is what provides mutual exclusion.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Value under `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value`, expiring after `ttl` when given.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError>;

    /// Store `value`, expiring after `ttl` when given, only if `key` is
    /// absent. Returns whether the value was stored.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Settings for [`SharedStorage`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedStorageConfig {
    /// Namespace prepended to every key
    pub prefix: String,
    /// Expiry of state records; `None` or zero keeps them forever
    pub state_ttl: Option<Duration>,
    /// Expiry of lock keys; zero never expires
    pub lock_ttl: Duration,
}

impl Default for SharedStorageConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            state_ttl: None,
            lock_ttl: DEFAULT_LOCK_TTL,
        }
    }
}

impl SharedStorageConfig {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    pub fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }
}

/// State storage and self-expiring locks on top of a [`KeyValueStore`].
///
/// Lock acquisition never waits: if the lock key exists the call fails with
/// [`StorageError::LockHeld`] and retrying is left to the engine.
///
/// # Example
///
/// ```rust
/// use lockstep::storage::{
///     LocalKeyValueStore, LockableStorage, SharedStorage, SharedStorageConfig, StateStorage,
/// };
/// use std::time::Duration;
///
/// let config = SharedStorageConfig::default().lock_ttl(Duration::from_secs(2));
/// let storage = SharedStorage::new(LocalKeyValueStore::new(), config);
///
/// storage.set_state("scan-1", "pending").unwrap();
/// let guard = storage.lock("scan-1").unwrap();
/// assert!(storage.lock("scan-1").is_err());
/// guard.release();
/// assert!(storage.lock("scan-1").is_ok());
/// ```
pub struct SharedStorage<K: KeyValueStore> {
    store: Arc<K>,
    config: SharedStorageConfig,
}

impl<K: KeyValueStore> SharedStorage<K> {
    pub fn new(store: K, config: SharedStorageConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Build on a store handle that other components also use.
    pub fn from_shared(store: Arc<K>, config: SharedStorageConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SharedStorageConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<K> {
        &self.store
    }

    pub fn state_key(&self, entity_id: &str) -> String {
        format!("{}:{}", self.config.prefix, entity_id)
    }

    pub fn lock_key(&self, entity_id: &str) -> String {
        format!("{}:lock:{}", self.config.prefix, entity_id)
    }
}

/// Zero means no expiry.
pub(crate) fn expiry(ttl: Duration) -> Option<Duration> {
    (!ttl.is_zero()).then_some(ttl)
}

impl<K: KeyValueStore> StateStorage for SharedStorage<K> {
    fn get_state(&self, entity_id: &str) -> Result<String, StorageError> {
        self.store
            .get(&self.state_key(entity_id))?
            .ok_or_else(|| StorageError::NotFound {
                entity_id: entity_id.to_string(),
            })
    }

    fn set_state(&self, entity_id: &str, state: &str) -> Result<(), StorageError> {
        self.store
            .set(
                &self.state_key(entity_id),
                state,
                self.config.state_ttl.and_then(expiry),
            )
    }
}

impl<K: KeyValueStore> LockableStorage for SharedStorage<K> {
    fn lock(&self, entity_id: &str) -> Result<LockGuard, StorageError> {
        let key = self.lock_key(entity_id);
        let acquired = self
            .store
            .set_if_absent(&key, LOCK_MARKER, expiry(self.config.lock_ttl))?;
        if !acquired {
            return Err(StorageError::LockHeld {
                entity_id: entity_id.to_string(),
            });
        }

        let store = Arc::clone(&self.store);
        Ok(LockGuard::new(move || {
            // The key expires on its own if this delete is lost.
            if let Err(e) = store.delete(&key) {
                tracing::warn!(lock_key = %key, error = %e, "failed to release shared lock");
            }
        }))
    }
}
