//! Redis-backed `KeyValueStore`.

use super::{expiry, KeyValueStore};
use crate::storage::StorageError;
use parking_lot::Mutex;
use redis::{Client, Connection, RedisResult};
use std::time::Duration;

/// Synchronous Redis client for the shared backend.
///
/// Holds one connection, opened lazily and reopened after any command error.
/// `set_if_absent` maps to `SET key value NX [PX ttl]`, which Redis executes
/// atomically. A zero TTL sends no `PX`, so the key never expires.
pub struct RedisStore {
    client: Client,
    connection: Mutex<Option<Connection>>,
}

impl RedisStore {
    /// Connect to `url`, e.g. `redis://localhost:6379`.
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let client = Client::open(url).map_err(StorageError::backend)?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            connection: Mutex::new(None),
        }
    }

    fn with_connection<T>(
        &self,
        command: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, StorageError> {
        let mut slot = self.connection.lock();
        if slot.is_none() {
            *slot = Some(self.client.get_connection().map_err(StorageError::backend)?);
        }
        let Some(connection) = slot.as_mut() else {
            return Err(StorageError::Backend("redis connection unavailable".to_string()));
        };

        match command(connection) {
            Ok(value) => Ok(value),
            Err(e) => {
                *slot = None;
                Err(StorageError::backend(e))
            }
        }
    }
}

fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_connection(|con| redis::cmd("GET").arg(key).query(con))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError> {
        self.with_connection(|con| {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value);
            if let Some(ttl) = ttl.and_then(expiry) {
                cmd.arg("PX").arg(millis(ttl));
            }
            cmd.query(con)
        })
    }

    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StorageError> {
        let reply: Option<String> = self.with_connection(|con| {
            let mut cmd = redis::cmd("SET");
            cmd.arg(key).arg(value).arg("NX");
            if let Some(ttl) = ttl.and_then(expiry) {
                cmd.arg("PX").arg(millis(ttl));
            }
            cmd.query(con)
        })?;
        Ok(reply.is_some())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.with_connection(|con| redis::cmd("DEL").arg(key).query::<i64>(con))
            .map(|_| ())
    }
}
