//! The engine that runs transitions against persisted state.

use crate::builder::{AutoLock, FsmConfig, TransitionHook};
use crate::core::{Event, State, TransitionRecord, TriggerContext};
use crate::engine::error::{FsmError, LifecyclePhase, StateRole};
use crate::engine::logger::{Logger, TracingLogger};
use crate::engine::retry;
use crate::storage::{LockGuard, StateStorage};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use stillwater::validation::Validation;

/// Finite state machine over externally persisted entities.
///
/// The engine holds no per-entity data of its own: every `trigger` reads the
/// current state name from storage, lets that state decide, runs exit and
/// entry actions, and writes the new name back. When an [`AutoLock`] is
/// configured, the whole sequence runs under the entity's lock.
pub struct Fsm {
    states: HashMap<String, Arc<dyn State>>,
    storage: Arc<dyn StateStorage>,
    auto_lock: Option<AutoLock>,
    logger: Arc<dyn Logger>,
    transition_hook: Option<TransitionHook>,
}

impl Fsm {
    /// Create an engine from its states and configuration.
    ///
    /// States are registered in order; a later state with an already
    /// registered name replaces the earlier one.
    pub fn new(states: Vec<Arc<dyn State>>, config: FsmConfig) -> Result<Self, FsmError> {
        let storage = match (config.validate(states.len()), config.resolve_storage()) {
            (Validation::Success(()), Some(storage)) => storage,
            (Validation::Failure(problems), _) => {
                return Err(FsmError::Configuration(problems.iter().cloned().collect()))
            }
            (Validation::Success(()), None) => {
                return Err(FsmError::Configuration(vec![
                    crate::builder::ConfigError::MissingStorage,
                ]))
            }
        };

        let mut registry = HashMap::with_capacity(states.len());
        for state in states {
            registry.insert(state.name().to_string(), state);
        }

        Ok(Self {
            states: registry,
            storage,
            auto_lock: config.auto_lock,
            logger: config
                .logger
                .unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn Logger>),
            transition_hook: config.transition_hook,
        })
    }

    /// Deliver `event` to the entity's current state and apply the result.
    ///
    /// Returns once the new state name is persisted, or with the first error.
    /// A transition to an empty name or to the current state is a no-op.
    ///
    /// If the target state's entry action fails, the current state's exit
    /// action has already run and is not undone; the persisted state stays
    /// the old one.
    pub fn trigger(&self, entity_id: &str, event: &Event) -> Result<(), FsmError> {
        let _lock = match &self.auto_lock {
            Some(auto_lock) => Some(self.acquire_lock(auto_lock, entity_id, event)?),
            None => None,
        };

        let current_name =
            self.storage
                .get_state(entity_id)
                .map_err(|source| FsmError::StateNotFound {
                    entity_id: entity_id.to_string(),
                    source,
                })?;

        let current = self.lookup(entity_id, &current_name, StateRole::Current)?;

        self.logger.info(
            entity_id,
            format_args!(
                "handling event '{}' in state '{}'",
                event.name(),
                current_name
            ),
        );

        let ctx = TriggerContext::new(entity_id);
        let transition = current.handle_event(ctx, event).map_err(|source| {
            self.logger
                .error(entity_id, format_args!("error handling event: {source}"));
            FsmError::TransitionRejected {
                entity_id: entity_id.to_string(),
                state: current_name.clone(),
                event: event.name().to_string(),
                source,
            }
        })?;

        let Some(next_name) = transition.target_from(&current_name) else {
            self.logger.info(entity_id, format_args!("no state change"));
            return Ok(());
        };

        let next = self.lookup(entity_id, next_name, StateRole::Target)?;

        current
            .on_exit(ctx, event)
            .map_err(|source| FsmError::Lifecycle {
                entity_id: entity_id.to_string(),
                state: current_name.clone(),
                phase: LifecyclePhase::Exit,
                source,
            })?;

        next.on_enter(ctx, event)
            .map_err(|source| FsmError::Lifecycle {
                entity_id: entity_id.to_string(),
                state: next.name().to_string(),
                phase: LifecyclePhase::Enter,
                source,
            })?;

        self.storage
            .set_state(entity_id, next.name())
            .map_err(|source| FsmError::Storage {
                entity_id: entity_id.to_string(),
                state: next.name().to_string(),
                source,
            })?;

        self.logger.info(
            entity_id,
            format_args!("transitioned {} -> {}", current_name, next.name()),
        );

        if let Some(hook) = &self.transition_hook {
            let record = TransitionRecord {
                entity_id: entity_id.to_string(),
                from: current_name,
                to: next.name().to_string(),
                event: event.clone(),
                timestamp: Utc::now(),
            };
            if let Err(e) = hook(&record) {
                self.logger
                    .error(entity_id, format_args!("transition hook failed: {e}"));
            }
        }

        Ok(())
    }

    /// Current persisted state name of `entity_id`.
    pub fn current_state(&self, entity_id: &str) -> Result<String, FsmError> {
        self.storage
            .get_state(entity_id)
            .map_err(|source| FsmError::StateNotFound {
                entity_id: entity_id.to_string(),
                source,
            })
    }

    /// Registered state names, sorted.
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether a state named `name` is registered.
    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// The registered state for `name`, if any.
    pub fn state(&self, name: &str) -> Option<&Arc<dyn State>> {
        self.states.get(name)
    }

    fn lookup(
        &self,
        entity_id: &str,
        name: &str,
        role: StateRole,
    ) -> Result<&Arc<dyn State>, FsmError> {
        self.states.get(name).ok_or_else(|| FsmError::UnknownState {
            entity_id: entity_id.to_string(),
            name: name.to_string(),
            role,
        })
    }

    fn acquire_lock(
        &self,
        auto_lock: &AutoLock,
        entity_id: &str,
        event: &Event,
    ) -> Result<LockGuard, FsmError> {
        retry::acquire(
            auto_lock.storage.as_ref(),
            entity_id,
            &auto_lock.retry,
            self.logger.as_ref(),
            thread::sleep,
        )
        .map_err(|failure| {
            self.logger.error(
                entity_id,
                format_args!("failed to acquire lock after retries: {}", failure.error),
            );
            if let Some(handler) = &auto_lock.on_failure {
                handler(entity_id, event);
            }
            FsmError::LockAcquisition {
                entity_id: entity_id.to_string(),
                attempts: failure.attempts,
                source: failure.error,
            }
        })
    }
}

impl fmt::Debug for Fsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("states", &self.state_names())
            .field("auto_lock", &self.auto_lock)
            .field("transition_hook", &self.transition_hook.is_some())
            .finish_non_exhaustive()
    }
}
