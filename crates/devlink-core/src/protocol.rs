//! Outbound message envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::LinkError;

/// Action name used by the keepalive.
pub const PING_ACTION: &str = "ping";

/// An outbound action, sent as a single JSON text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action: String,
    pub data: Value,
}

impl Action {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }

    /// An action with an empty `data` object.
    pub fn named(action: impl Into<String>) -> Self {
        Self::new(action, json!({}))
    }

    /// The keepalive action.
    pub fn ping() -> Self {
        Self::named(PING_ACTION)
    }

    /// Serialize to the text frame sent over the socket.
    pub fn encode(&self) -> Result<String, LinkError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The keepalive frame, `{"action":"ping","data":{}}`.
pub(crate) fn ping_frame() -> String {
    json!({"action": PING_ACTION, "data": {}}).to_string()
}
