//! Engine configuration and the fluent builder.
//!
//! [`FsmConfig`] lists every option the engine recognizes; [`FsmBuilder`]
//! fills one in and validates it, reporting every missing field at once.

pub mod config;
pub mod error;
pub mod machine;

pub use config::{AutoLock, FsmConfig, LockFailureHandler, TransitionHook};
pub use error::ConfigError;
pub use machine::FsmBuilder;
