//! Lock acquisition with bounded retries and exponential backoff.

use super::logger::Logger;
use crate::storage::{LockGuard, LockableStorage, StorageError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How hard the engine tries to take an entity lock.
///
/// `max_retries + 1` attempts are made in total. After failed attempt `i`
/// (zero-based) the engine sleeps `backoff_interval * 2^i` before trying
/// again. There is no jitter and no sleep after the last attempt.
///
/// # Example
///
/// ```rust
/// use lockstep::engine::LockRetryConfig;
/// use std::time::Duration;
///
/// let retry = LockRetryConfig::new(3, Duration::from_millis(10));
/// let delays: Vec<_> = retry.delays().collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(10),
///         Duration::from_millis(20),
///         Duration::from_millis(40),
///     ]
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockRetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base interval, doubled after every failed attempt
    pub backoff_interval: Duration,
}

impl LockRetryConfig {
    pub fn new(max_retries: u32, backoff_interval: Duration) -> Self {
        Self {
            max_retries,
            backoff_interval,
        }
    }

    /// Total number of lock attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep after failed attempt `attempt` (zero-based). Saturates at
    /// `Duration::MAX`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.backoff_interval.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Every sleep taken when all attempts fail, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |attempt| self.delay_for(attempt))
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub(crate) struct LockFailure {
    pub error: StorageError,
    pub attempts: u32,
}

/// Try to lock `entity_id`, sleeping between attempts with `sleep`.
pub(crate) fn acquire<F>(
    storage: &dyn LockableStorage,
    entity_id: &str,
    config: &LockRetryConfig,
    logger: &dyn Logger,
    mut sleep: F,
) -> Result<LockGuard, LockFailure>
where
    F: FnMut(Duration),
{
    let mut attempt = 0u32;
    loop {
        match storage.lock(entity_id) {
            Ok(guard) => {
                if attempt > 0 {
                    logger.info(
                        entity_id,
                        format_args!("lock acquired after {} attempt(s)", attempt + 1),
                    );
                }
                return Ok(guard);
            }
            Err(error) => {
                if attempt >= config.max_retries {
                    if config.max_retries == 0 {
                        logger.info(entity_id, format_args!("lock failed, no retries set"));
                    }
                    return Err(LockFailure {
                        error,
                        attempts: attempt + 1,
                    });
                }

                let delay = config.delay_for(attempt);
                logger.info(
                    entity_id,
                    format_args!(
                        "lock attempt {} failed, retrying in {:?}",
                        attempt + 1,
                        delay
                    ),
                );
                sleep(delay);
                attempt += 1;
            }
        }
    }
}
