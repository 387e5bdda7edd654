//! Errors returned by the engine.

use crate::builder::ConfigError;
use crate::core::{HookError, Rejection};
use crate::storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Which side of a transition an unknown state name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRole {
    /// The persisted state of the entity
    Current,
    /// The target returned by the current state's event handler
    Target,
}

impl fmt::Display for StateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Target => f.write_str("next"),
        }
    }
}

/// Entry or exit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Enter,
    Exit,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => f.write_str("enter"),
            Self::Exit => f.write_str("exit"),
        }
    }
}

/// Errors that can occur when building an engine or triggering a transition.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("invalid engine configuration: {}", describe(.0))]
    Configuration(Vec<ConfigError>),

    #[error("failed to acquire lock for entity '{entity_id}' after {attempts} attempt(s): {source}")]
    LockAcquisition {
        entity_id: String,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("no state found for entity '{entity_id}': {source}")]
    StateNotFound {
        entity_id: String,
        #[source]
        source: StorageError,
    },

    #[error("{role} state not found: '{name}' (entity '{entity_id}')")]
    UnknownState {
        entity_id: String,
        name: String,
        role: StateRole,
    },

    #[error("state '{state}' rejected event '{event}' for entity '{entity_id}': {source}")]
    TransitionRejected {
        entity_id: String,
        state: String,
        event: String,
        #[source]
        source: Rejection,
    },

    #[error("{phase} action of state '{state}' failed for entity '{entity_id}': {source}")]
    Lifecycle {
        entity_id: String,
        state: String,
        phase: LifecyclePhase,
        #[source]
        source: HookError,
    },

    #[error("failed to persist state '{state}' for entity '{entity_id}': {source}")]
    Storage {
        entity_id: String,
        state: String,
        #[source]
        source: StorageError,
    },
}

fn describe(problems: &[ConfigError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
