//! Logging capability injected into the engine.

use std::fmt;

/// Where the engine reports what it is doing.
///
/// Logging is a side channel: every failure is also returned as an error.
pub trait Logger: Send + Sync {
    fn info(&self, entity_id: &str, message: fmt::Arguments<'_>);
    fn error(&self, entity_id: &str, message: fmt::Arguments<'_>);
}

/// Forwards engine messages to `tracing` with the entity id as a field.
///
/// This is the engine's default logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, entity_id: &str, message: fmt::Arguments<'_>) {
        tracing::info!(entity_id = %entity_id, "{}", message);
    }

    fn error(&self, entity_id: &str, message: fmt::Arguments<'_>) {
        tracing::error!(entity_id = %entity_id, "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _entity_id: &str, _message: fmt::Arguments<'_>) {}

    fn error(&self, _entity_id: &str, _message: fmt::Arguments<'_>) {}
}
