//! The `State` trait implemented by every state registered with an engine.

use super::event::Event;
use super::transition::Transition;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed error type carried by lifecycle failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Typed context passed to state behavior.
///
/// Carries the entity being driven so states never have to dig it out of an
/// untyped slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerContext<'a> {
    pub entity_id: &'a str,
}

impl<'a> TriggerContext<'a> {
    pub fn new(entity_id: &'a str) -> Self {
        Self { entity_id }
    }
}

/// A state refused to handle an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Rejection for an event the state does not understand.
    pub fn unexpected(state: &str, event: &Event) -> Self {
        Self::new(format!("{state}: unexpected event '{}'", event.name()))
    }
}

/// Failure of an entry/exit action or of a transition hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Source(BoxError),
}

impl HookError {
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::Message(message.to_string())
    }

    pub fn source<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Source(Box::new(error))
    }
}

/// Behavior of a single named state.
///
/// States are registered once when the engine is built and are shared across
/// every `trigger` call, so they take `&self`; domain data that changes on
/// entry or exit lives behind interior mutability.
///
/// # Example
///
/// ```rust
/// use lockstep::core::{Event, Rejection, State, Transition, TriggerContext};
///
/// struct Pending;
///
/// impl State for Pending {
///     fn name(&self) -> &str {
///         "pending"
///     }
///
///     fn handle_event(
///         &self,
///         _ctx: TriggerContext<'_>,
///         event: &Event,
///     ) -> Result<Transition, Rejection> {
///         match event.name() {
///             "start" => Ok(Transition::to("running")),
///             _ => Err(Rejection::unexpected(self.name(), event)),
///         }
///     }
/// }
///
/// let ctx = TriggerContext::new("scan-1");
/// let transition = Pending.handle_event(ctx, &Event::named("start")).unwrap();
/// assert_eq!(transition, Transition::to("running"));
/// ```
pub trait State: Send + Sync {
    /// Registry key for this state. Must be stable for the state's lifetime.
    fn name(&self) -> &str;

    /// Runs after the previous state's `on_exit`, before the name is persisted.
    fn on_enter(&self, _ctx: TriggerContext<'_>, _event: &Event) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs before the next state's `on_enter`.
    fn on_exit(&self, _ctx: TriggerContext<'_>, _event: &Event) -> Result<(), HookError> {
        Ok(())
    }

    /// Decide whether and where to move on `event`.
    fn handle_event(&self, ctx: TriggerContext<'_>, event: &Event)
        -> Result<Transition, Rejection>;
}
