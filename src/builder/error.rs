//! Configuration problems detected when building an engine.

use thiserror::Error;

/// A required piece of engine configuration is missing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No states registered. Add at least one state")]
    NoStates,

    #[error("StateStorage is required. Call .storage(..) or .auto_lock(..)")]
    MissingStorage,
}
