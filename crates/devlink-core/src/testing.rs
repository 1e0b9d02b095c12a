//! In-memory doubles for the transport, notification and reload seams.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::SinkExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, Notify};
use url::Url;

use crate::error::LinkError;
use crate::notify::Notifier;
use crate::reload::Reloader;
use crate::session::{MessageHandler, SessionEvent};
use crate::transport::{AuthProbe, AuthResponse, FrameSink, FrameStream, SocketConnector};

/// Server side of an in-memory socket.
pub(crate) struct MemoryPeer {
    pub url: Url,
    /// Frames written by the client.
    pub from_client: fmpsc::UnboundedReceiver<String>,
    /// Frames delivered to the client. Dropping it closes the socket.
    pub to_client: fmpsc::UnboundedSender<Result<String, LinkError>>,
}

/// Connector whose sockets are in-memory channel pairs.
///
/// When gated, `connect` waits until the returned [`Notify`] is notified, so
/// tests can observe the session while it is still opening.
pub(crate) struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    gate: Option<Arc<Notify>>,
    refuse: bool,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        (
            Self {
                peers,
                gate: None,
                refuse: false,
            },
            rx,
        )
    }

    pub fn gated() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>, Arc<Notify>) {
        let (mut connector, rx) = Self::new();
        let gate = Arc::new(Notify::new());
        connector.gate = Some(gate.clone());
        (connector, rx, gate)
    }

    pub fn refusing() -> Self {
        let (mut connector, _) = Self::new();
        connector.refuse = true;
        connector
    }
}

#[async_trait]
impl SocketConnector for MemoryConnector {
    async fn connect(&self, url: &Url) -> Result<(FrameSink, FrameStream), LinkError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.refuse {
            return Err(LinkError::WebSocket("connection refused".to_string()));
        }

        let (client_tx, from_client) = fmpsc::unbounded::<String>();
        let (to_client, client_rx) = fmpsc::unbounded::<Result<String, LinkError>>();

        let _ = self.peers.send(MemoryPeer {
            url: url.clone(),
            from_client,
            to_client,
        });

        let sink = client_tx.sink_map_err(|e| LinkError::WebSocket(e.to_string()));
        Ok((Box::pin(sink), Box::pin(client_rx)))
    }
}

/// Probe answering every request with a fixed result.
pub(crate) struct StaticAuthProbe {
    status: Option<u16>,
    requests: Mutex<Vec<Url>>,
}

impl StaticAuthProbe {
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails at the transport level.
    pub fn unreachable() -> Self {
        Self {
            status: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AuthProbe for StaticAuthProbe {
    async fn probe(&self, url: &Url) -> Result<AuthResponse, LinkError> {
        self.requests.lock().push(url.clone());
        match self.status {
            Some(status) => Ok(AuthResponse {
                url: url.clone(),
                status,
            }),
            None => Err(LinkError::Transport(format!(
                "error sending request for url ({}): Connection refused",
                url
            ))),
        }
    }
}

/// Notifier that keeps every notification text.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub texts: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify_message(&self, message: &str) {
        self.texts.lock().push(message.to_string());
    }

    fn notify_error(&self, error: &LinkError) {
        self.texts
            .lock()
            .push(crate::notify::format_error(error));
    }
}

/// Reloader that records requested delays.
#[derive(Default)]
pub(crate) struct RecordingReloader {
    pub delays: Mutex<Vec<Duration>>,
}

impl Reloader for RecordingReloader {
    fn reload_in(&self, delay: Duration) {
        self.delays.lock().push(delay);
    }
}

/// Message handler pushing every frame into a channel.
pub(crate) fn channel_handler() -> (MessageHandler, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: MessageHandler = Arc::new(move |text| {
        let _ = tx.send(text);
    });
    (handler, rx)
}

/// Wait until `events` yields an event matching `predicate`.
pub(crate) async fn wait_for<F>(events: &mut broadcast::Receiver<SessionEvent>, predicate: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    loop {
        match events.recv().await {
            Ok(event) if predicate(&event) => return event,
            Ok(_) => continue,
            Err(e) => panic!("session events ended: {}", e),
        }
    }
}

/// Drain the peer's inbound frames without waiting.
pub(crate) fn drain(peer: &mut MemoryPeer) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(Some(frame)) = peer.from_client.try_next() {
        frames.push(frame);
    }
    frames
}
