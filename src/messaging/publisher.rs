//! Publishing events keyed by entity id.

use super::codec::{EventCodec, JsonEventCodec};
use super::{Message, MessageSink, MessagingError};
use crate::core::Event;
use serde_json::Value;

/// Encodes events and sends them keyed by entity id, so a partitioned
/// transport keeps per-entity ordering.
pub struct EventPublisher<S: MessageSink, C: EventCodec = JsonEventCodec> {
    sink: S,
    codec: C,
}

impl<S: MessageSink> EventPublisher<S> {
    pub fn new(sink: S) -> Self {
        Self::with_codec(sink, JsonEventCodec)
    }
}

impl<S: MessageSink, C: EventCodec> EventPublisher<S, C> {
    pub fn with_codec(sink: S, codec: C) -> Self {
        Self { sink, codec }
    }

    pub fn publish(&self, entity_id: &str, event: &Event) -> Result<(), MessagingError> {
        let value = self.codec.encode(event).map_err(MessagingError::Encode)?;
        self.sink.send(Message::new(entity_id, value))
    }

    /// Publish `name` with `payload` for `entity_id`.
    pub fn publish_named(
        &self,
        entity_id: &str,
        name: &str,
        payload: Value,
    ) -> Result<(), MessagingError> {
        self.publish(entity_id, &Event::new(name, payload))
    }
}
