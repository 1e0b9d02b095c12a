//! Event bridge.
//!
//! UI-facing code holds a [`LinkBridge`] and raises intents through it:
//! "connect" and "send". It never sees the session. Exactly one
//! [`LinkListener`] is installed at startup to act on those intents.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::LinkError;
use crate::protocol::Action;
use crate::session::MessageHandler;

/// Intent to connect to the device behind `location`.
///
/// `location` is the raw page location; picking the root from it, `host`
/// parameter included, is the listener's job.
pub struct ConnectRequest {
    pub location: Url,
    pub on_message: MessageHandler,
}

/// Intent to write `data` to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub data: String,
}

/// The single consumer of bridge intents.
pub trait LinkListener: Send + Sync {
    /// Start connecting. Must not block; failures, an unusable location
    /// included, are the listener's to handle.
    fn on_connect(&self, request: ConnectRequest);

    /// Write to the session, reporting failure synchronously.
    fn on_send(&self, request: SendRequest) -> Result<(), LinkError>;
}

struct BridgeInner {
    location: Url,
    listener: OnceLock<Arc<dyn LinkListener>>,
}

/// Cloneable handle for raising connect and send intents.
#[derive(Clone)]
pub struct LinkBridge {
    inner: Arc<BridgeInner>,
}

impl LinkBridge {
    /// Create a bridge for a client served from `location`.
    pub fn new(location: Url) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                location,
                listener: OnceLock::new(),
            }),
        }
    }

    /// The page location connect targets are resolved from.
    pub fn location(&self) -> &Url {
        &self.inner.location
    }

    /// Install the listener. Only the first install succeeds.
    pub fn install(&self, listener: Arc<dyn LinkListener>) -> Result<(), LinkError> {
        self.inner
            .listener
            .set(listener)
            .map_err(|_| LinkError::ListenerInstalled)
    }

    fn listener(&self) -> Result<&Arc<dyn LinkListener>, LinkError> {
        self.inner.listener.get().ok_or(LinkError::NoListener)
    }

    /// Ask for a session to the device.
    ///
    /// Only a missing listener is reported. The outcome of the handshake,
    /// including a location that names no usable device, is not.
    pub fn connect<F>(&self, on_message: F) -> Result<(), LinkError>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let listener = self.listener()?;
        debug!("connect requested from {}", self.inner.location);

        listener.on_connect(ConnectRequest {
            location: self.inner.location.clone(),
            on_message: Arc::new(on_message),
        });
        Ok(())
    }

    /// Send a raw text frame.
    pub fn send(&self, data: impl Into<String>) -> Result<(), LinkError> {
        self.listener()?.on_send(SendRequest { data: data.into() })
    }

    /// Send `{"action": action, "data": data}`.
    pub fn send_action(&self, action: &str, data: Value) -> Result<(), LinkError> {
        let text = Action::new(action, data).encode()?;
        self.send(text)
    }
}
