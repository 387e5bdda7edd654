//! Events that drive state transitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named signal with an opaque payload.
///
/// The engine only ever looks at the name (for logging); the payload is
/// interpreted by state behavior alone.
///
/// # Example
///
/// ```rust
/// use lockstep::core::Event;
/// use serde_json::json;
///
/// let event = Event::new("start_scan", json!({ "requested_by": "dispatcher" }));
/// assert_eq!(event.name(), "start_scan");
/// assert_eq!(event.payload()["requested_by"], "dispatcher");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    #[serde(default)]
    payload: Value,
}

impl Event {
    /// Create an event with a payload.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Create an event with a `null` payload.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consume the event, returning its payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }
}
