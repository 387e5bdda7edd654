//! The state machine engine.
//!
//! [`Fsm::trigger`] is the only way state changes:
//!
//! 1. take the entity lock, retrying with exponential backoff
//! 2. read the current state name and resolve it in the registry
//! 3. let the current state handle the event
//! 4. run exit and entry actions, then persist the new name
//! 5. notify the transition hook
//!
//! The lock, when configured, is held across all of it and released on
//! every return path.

pub mod error;
pub mod logger;
pub mod machine;
pub mod retry;

pub use error::{FsmError, LifecyclePhase, StateRole};
pub use logger::{Logger, NoopLogger, TracingLogger};
pub use machine::Fsm;
pub use retry::LockRetryConfig;
