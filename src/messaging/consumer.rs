//! Feeding transport messages into an engine.

use super::codec::{EventCodec, JsonEventCodec};
use super::{MessageSource, MessagingError};
use crate::engine::Fsm;
use std::sync::Arc;
use tracing::{error, info};

/// What happened to one fetched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Triggered successfully and committed
    Committed,
    /// Could not be decoded; left uncommitted
    Undecodable,
    /// The engine returned an error; left uncommitted
    Failed,
}

/// Totals reported by [`Consumer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub committed: usize,
    pub undecodable: usize,
    pub failed: usize,
}

impl ConsumerStats {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Committed => self.committed += 1,
            Delivery::Undecodable => self.undecodable += 1,
            Delivery::Failed => self.failed += 1,
        }
    }
}

/// Reads messages, decodes them into events and triggers the engine with the
/// message key as entity id.
///
/// Only messages whose trigger succeeded are committed. Decode and trigger
/// failures are logged and skipped.
pub struct Consumer<S: MessageSource, C: EventCodec = JsonEventCodec> {
    source: S,
    engine: Arc<Fsm>,
    codec: C,
}

impl<S: MessageSource> Consumer<S> {
    pub fn new(source: S, engine: Arc<Fsm>) -> Self {
        Self::with_codec(source, engine, JsonEventCodec)
    }
}

impl<S: MessageSource, C: EventCodec> Consumer<S, C> {
    pub fn with_codec(source: S, engine: Arc<Fsm>, codec: C) -> Self {
        Self {
            source,
            engine,
            codec,
        }
    }

    /// Process one message. `Ok(None)` means the source has nothing left.
    pub fn poll_once(&mut self) -> Result<Option<Delivery>, MessagingError> {
        let Some(message) = self.source.fetch()? else {
            return Ok(None);
        };

        let event = match self.codec.decode(&message.value) {
            Ok(event) => event,
            Err(e) => {
                error!(key = %message.key, error = %e, "failed to decode message");
                return Ok(Some(Delivery::Undecodable));
            }
        };

        if let Err(e) = self.engine.trigger(&message.key, &event) {
            error!(
                entity_id = %message.key,
                event = %event.name(),
                error = %e,
                "failed to apply event"
            );
            return Ok(Some(Delivery::Failed));
        }

        self.source.commit(&message)?;
        Ok(Some(Delivery::Committed))
    }

    /// Drain the source. Transport errors stop the loop and are returned.
    pub fn run(&mut self) -> Result<ConsumerStats, MessagingError> {
        let mut stats = ConsumerStats::default();
        while let Some(delivery) = self.poll_once()? {
            stats.record(delivery);
        }
        info!(
            committed = stats.committed,
            undecodable = stats.undecodable,
            failed = stats.failed,
            "message source drained"
        );
        Ok(stats)
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
