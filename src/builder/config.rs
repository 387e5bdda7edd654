//! The engine's configuration value object.

use crate::builder::error::ConfigError;
use crate::core::{Event, HookError, TransitionRecord};
use crate::engine::{LockRetryConfig, Logger};
use crate::storage::{LockableStorage, StateStorage};
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Observer called after a transition has been persisted. Errors are logged
/// by the engine and never returned from `trigger`.
pub type TransitionHook = Arc<dyn Fn(&TransitionRecord) -> Result<(), HookError> + Send + Sync>;

/// Called once when every lock attempt for an entity has failed.
pub type LockFailureHandler = Arc<dyn Fn(&str, &Event) + Send + Sync>;

/// Lock discipline: which storage to lock, how to retry, and who to tell
/// when retries run out.
#[derive(Clone)]
pub struct AutoLock {
    pub storage: Arc<dyn LockableStorage>,
    pub retry: LockRetryConfig,
    pub on_failure: Option<LockFailureHandler>,
}

impl AutoLock {
    pub fn new(storage: Arc<dyn LockableStorage>, retry: LockRetryConfig) -> Self {
        Self {
            storage,
            retry,
            on_failure: None,
        }
    }

    /// Set the handler invoked when the lock cannot be acquired.
    pub fn on_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &Event) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(handler));
        self
    }

    /// The locked storage viewed as plain state storage.
    pub fn state_storage(&self) -> Arc<dyn StateStorage> {
        Arc::new(Arc::clone(&self.storage))
    }
}

impl fmt::Debug for AutoLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoLock")
            .field("retry", &self.retry)
            .field("on_failure", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}

/// Every option the engine recognizes.
///
/// Only storage is required. If `storage` is unset but `auto_lock` is, the
/// lockable storage doubles as the state storage.
#[derive(Clone, Default)]
pub struct FsmConfig {
    pub storage: Option<Arc<dyn StateStorage>>,
    pub auto_lock: Option<AutoLock>,
    /// Defaults to [`crate::engine::TracingLogger`]
    pub logger: Option<Arc<dyn Logger>>,
    pub transition_hook: Option<TransitionHook>,
}

impl FsmConfig {
    /// The storage the engine will read and write through, if any.
    pub fn resolve_storage(&self) -> Option<Arc<dyn StateStorage>> {
        self.storage
            .clone()
            .or_else(|| self.auto_lock.as_ref().map(AutoLock::state_storage))
    }

    /// Check required fields, accumulating ALL problems.
    pub fn validate(&self, state_count: usize) -> Validation<(), NonEmptyVec<ConfigError>> {
        let checks = vec![
            require(state_count > 0, ConfigError::NoStates),
            require(self.resolve_storage().is_some(), ConfigError::MissingStorage),
        ];
        Validation::all_vec(checks).map(|_| ())
    }
}

fn require(ok: bool, problem: ConfigError) -> Validation<(), NonEmptyVec<ConfigError>> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(problem)
    }
}

impl fmt::Debug for FsmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmConfig")
            .field("storage", &self.storage.is_some())
            .field("auto_lock", &self.auto_lock)
            .field("logger", &self.logger.is_some())
            .field("transition_hook", &self.transition_hook.is_some())
            .finish()
    }
}
