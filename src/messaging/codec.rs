//! Wire encoding of events.

use crate::core::Event;
use thiserror::Error;

/// Errors decoding an event from bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed event envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid event: name is empty")]
    EmptyName,
}

/// Turns transport payloads into events and back.
pub trait EventCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Event, DecodeError>;

    fn encode(&self, event: &Event) -> Result<Vec<u8>, serde_json::Error>;
}

/// JSON envelope codec: `{"name": string, "payload": any}`.
///
/// A missing payload decodes as `null`.
///
/// # Example
///
/// ```rust
/// use lockstep::messaging::{EventCodec, JsonEventCodec};
///
/// let event = JsonEventCodec.decode(br#"{"name":"start_scan","payload":{"jobs":3}}"#).unwrap();
/// assert_eq!(event.name(), "start_scan");
/// assert_eq!(event.payload()["jobs"], 3);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventCodec;

impl EventCodec for JsonEventCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Event, DecodeError> {
        let event: Event = serde_json::from_slice(bytes)?;
        if event.name().is_empty() {
            return Err(DecodeError::EmptyName);
        }
        Ok(event)
    }

    fn encode(&self, event: &Event) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(event)
    }
}
