//! Messaging adapters around the engine.
//!
//! The engine only ever sees decoded [`Event`](crate::core::Event)s. This
//! module covers the glue on either side of it: encoding events into keyed
//! messages, and a consumer that decodes messages and triggers the engine.
//! The transport itself is abstract ([`MessageSink`], [`MessageSource`]);
//! [`MemoryQueue`] is an in-process implementation.
//!
//! Events for one entity are expected to reach one consumer in publish
//! order. Keying messages by entity id lets a partitioned transport provide
//! that; nothing here enforces it.

pub mod codec;
pub mod consumer;
pub mod memory;
pub mod publisher;

use thiserror::Error;

pub use codec::{DecodeError, EventCodec, JsonEventCodec};
pub use consumer::{Consumer, ConsumerStats, Delivery};
pub use memory::MemoryQueue;
pub use publisher::EventPublisher;

/// A keyed transport message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Entity id the message belongs to
    pub key: String,
    pub value: Vec<u8>,
}

impl Message {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Errors from the messaging layer.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Outgoing side of a transport.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: Message) -> Result<(), MessagingError>;
}

/// Incoming side of a transport.
pub trait MessageSource: Send {
    /// Next message, or `None` once the source is exhausted.
    fn fetch(&mut self) -> Result<Option<Message>, MessagingError>;

    /// Acknowledge a fetched message.
    fn commit(&mut self, message: &Message) -> Result<(), MessagingError>;
}
