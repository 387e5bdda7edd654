//! Transition decisions and records of completed transitions.

use super::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The outcome of a state handling an event.
///
/// An empty target, or a target equal to the current state's name, means
/// "stay where you are".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub next_state: String,
}

impl Transition {
    /// Move to the named state.
    pub fn to(next_state: impl Into<String>) -> Self {
        Self {
            next_state: next_state.into(),
        }
    }

    /// Stay in the current state.
    pub fn stay() -> Self {
        Self::default()
    }

    /// The target name, or `None` if this transition leaves `current` unchanged.
    pub fn target_from(&self, current: &str) -> Option<&str> {
        if self.next_state.is_empty() || self.next_state == current {
            None
        } else {
            Some(&self.next_state)
        }
    }
}

/// Record of a transition that has been persisted.
///
/// Handed to the transition hook after the new state name is stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The entity whose state changed
    pub entity_id: String,
    /// Name of the state being left
    pub from: String,
    /// Name of the state being entered
    pub to: String,
    /// The event that caused the transition
    pub event: Event,
    /// When the new state was persisted
    pub timestamp: DateTime<Utc>,
}
