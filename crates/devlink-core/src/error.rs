//! Link error types.

use thiserror::Error;
use url::Url;

/// Errors produced by the device link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The root URL cannot serve as a base for the endpoint paths.
    #[error("Invalid root URL: {0}")]
    InvalidRoot(String),

    /// The auth endpoint answered with something other than 200.
    #[error("{url} responded with status code {status}")]
    HandshakeRejected { url: Url, status: u16 },

    /// The auth request never completed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Send attempted while no socket exists.
    #[error("WebSocket disconnected!")]
    NotConnected,

    /// No listener is installed on the bridge.
    #[error("No link listener installed")]
    NoListener,

    /// A listener is already installed on the bridge.
    #[error("Link listener already installed")]
    ListenerInstalled,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LinkError {
    /// Short name of the failure kind, shown as the first line of a notification.
    pub fn kind(&self) -> &'static str {
        match self {
            LinkError::InvalidRoot(_) => "InvalidRoot",
            LinkError::HandshakeRejected { .. } => "HandshakeRejected",
            LinkError::Transport(_) => "TransportFailure",
            LinkError::WebSocket(_) => "WebSocketError",
            LinkError::NotConnected => "NotConnected",
            LinkError::NoListener => "NoListener",
            LinkError::ListenerInstalled => "ListenerInstalled",
            LinkError::Serialization(_) => "SerializationError",
        }
    }
}

/// Render an error followed by each of its sources, `: `-separated.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        // reqwest and hyper often repeat the inner message in the outer one
        if !text.contains(&message) {
            text.push_str(": ");
            text.push_str(&message);
        }
        source = cause.source();
    }
    text
}

impl From<tokio_tungstenite::tungstenite::Error> for LinkError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        LinkError::WebSocket(error_chain(&e))
    }
}

impl From<reqwest::Error> for LinkError {
    fn from(e: reqwest::Error) -> Self {
        LinkError::Transport(error_chain(&e))
    }
}

impl From<url::ParseError> for LinkError {
    fn from(e: url::ParseError) -> Self {
        LinkError::InvalidRoot(e.to_string())
    }
}
