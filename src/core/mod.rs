//! Core value types and the `State` trait.
//!
//! This module contains the pieces every other module builds on:
//! - `Event`: the named signal that drives transitions
//! - `Transition`: a state's decision about where to go next
//! - `State`: named behavior with entry, exit and event handling
//! - `TransitionRecord`: what the transition hook is told after a change

mod event;
mod state;
mod transition;

pub use event::Event;
pub use state::{BoxError, HookError, Rejection, State, TriggerContext};
pub use transition::{Transition, TransitionRecord};
