//! Connection state.
//!
//! A [`Session`] owns at most one live socket at a time. Its lifecycle is
//!
//! ```text
//! Idle ──open()──► Opening ──transport open──► Connected
//!   ▲                 │                            │
//!   └─────────────────┴──────────close─────────────┘
//! ```
//!
//! "Connected" is defined by the keepalive being installed, not by the
//! socket existing: the socket writer exists from the moment `open()` is
//! called, before the transport acknowledges the connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::endpoints::EndpointSet;
use crate::error::LinkError;
use crate::keepalive::KeepaliveGuard;
use crate::transport::SocketConnector;

/// Consumer callback for inbound text frames.
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Default keepalive period.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_millis(5000);

/// Observable session transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A socket was created and is waiting for the transport.
    Opening { generation: u64, url: Url },
    /// The transport acknowledged the socket; keepalive is running.
    Opened { generation: u64 },
    /// The session went back to idle.
    Closed { generation: u64 },
    /// A live session was closed to make room for a new one.
    Superseded { previous: u64, next: u64 },
}

/// State of the current socket. Present from `open()` until close.
struct Live {
    generation: u64,
    writer: mpsc::UnboundedSender<String>,
    endpoints: EndpointSet,
    keepalive: Option<KeepaliveGuard>,
    cancel: CancellationToken,
}

impl Drop for Live {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The device session.
pub struct Session {
    connector: Arc<dyn SocketConnector>,
    keepalive_interval: Duration,
    live: Mutex<Option<Live>>,
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(connector: Arc<dyn SocketConnector>, keepalive_interval: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            connector,
            keepalive_interval,
            live: Mutex::new(None),
            generation: AtomicU64::new(0),
            events,
        })
    }

    /// Open a session against `endpoints.socket()`.
    ///
    /// Any live session is closed first and a [`SessionEvent::Superseded`]
    /// is emitted. Inbound text frames are handed to `on_message` unchanged.
    /// Must be called from within a tokio runtime.
    pub fn open(self: &Arc<Self>, endpoints: EndpointSet, on_message: MessageHandler) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let url = endpoints.socket().clone();
        let (writer, outbound) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let previous = self.live.lock().replace(Live {
            generation,
            writer,
            endpoints,
            keepalive: None,
            cancel: cancel.clone(),
        });

        if let Some(previous) = previous {
            let previous_generation = previous.generation;
            drop(previous);
            info!(
                "Session {} superseded by session {}",
                previous_generation, generation
            );
            self.emit(SessionEvent::Closed {
                generation: previous_generation,
            });
            self.emit(SessionEvent::Superseded {
                previous: previous_generation,
                next: generation,
            });
        }

        debug!("Session {} opening {}", generation, url);
        self.emit(SessionEvent::Opening {
            generation,
            url: url.clone(),
        });

        let session = Arc::clone(self);
        tokio::spawn(async move {
            session
                .run(generation, url, outbound, cancel, on_message)
                .await;
        });
    }

    /// Write a text frame to the socket.
    ///
    /// Fails with [`LinkError::NotConnected`] when no socket exists. A send
    /// while the socket is still opening is handed to the transport and
    /// written once it is up.
    pub fn send(&self, payload: impl Into<String>) -> Result<(), LinkError> {
        let live = self.live.lock();
        let live = live.as_ref().ok_or(LinkError::NotConnected)?;
        live.writer
            .send(payload.into())
            .map_err(|_| LinkError::NotConnected)
    }

    /// Whether the keepalive is running.
    pub fn connected(&self) -> bool {
        self.live
            .lock()
            .as_ref()
            .is_some_and(|live| live.keepalive.is_some())
    }

    /// Copy of the endpoints used by the current session.
    pub fn urls(&self) -> Option<EndpointSet> {
        self.live.lock().as_ref().map(|live| live.endpoints.clone())
    }

    /// Number of the most recently opened session, 0 before the first open.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Drop the live session, if any. Used when the whole client is torn down.
    pub(crate) fn reset(&self) {
        let closed = self.live.lock().take();
        if let Some(closed) = closed {
            let generation = closed.generation;
            drop(closed);
            debug!("Session {} reset", generation);
            self.emit(SessionEvent::Closed { generation });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Transport acknowledged the socket: install the keepalive.
    ///
    /// Returns false if this generation is no longer the live one.
    fn handle_open(&self, generation: u64) -> bool {
        let mut live = self.live.lock();
        match live.as_mut() {
            Some(live) if live.generation == generation => {
                live.keepalive = Some(KeepaliveGuard::start(
                    self.keepalive_interval,
                    live.writer.clone(),
                ));
            }
            _ => return false,
        }
        drop(live);

        info!("Session {} connected", generation);
        self.emit(SessionEvent::Opened { generation });
        true
    }

    /// Socket went away: release keepalive and socket, back to idle.
    ///
    /// A close from a superseded generation leaves the newer session alone.
    fn handle_close(&self, generation: u64) {
        let closed = {
            let mut live = self.live.lock();
            match live.as_ref() {
                Some(current) if current.generation == generation => live.take(),
                _ => None,
            }
        };

        if closed.is_some() {
            drop(closed);
            info!("Session {} closed", generation);
            self.emit(SessionEvent::Closed { generation });
        }
    }

    async fn run(
        self: Arc<Self>,
        generation: u64,
        url: Url,
        mut outbound: mpsc::UnboundedReceiver<String>,
        cancel: CancellationToken,
        on_message: MessageHandler,
    ) {
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = self.connector.connect(&url) => result,
        };

        let (mut sink, mut stream) = match connected {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Session {} failed to open {}: {}", generation, url, e);
                self.handle_close(generation);
                return;
            }
        };

        if !self.handle_open(generation) {
            let _ = sink.close().await;
            return;
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = sink.close().await;
                    return;
                }
                Some(payload) = outbound.recv() => {
                    trace!("Session {} send: {}", generation, payload);
                    if let Err(e) = sink.send(payload).await {
                        warn!("Session {} write failed: {}", generation, e);
                        break;
                    }
                }
                frame = stream.next() => match frame {
                    Some(Ok(text)) => {
                        trace!("Session {} recv: {}", generation, text);
                        on_message(text);
                    }
                    Some(Err(e)) => {
                        warn!("Session {} read failed: {}", generation, e);
                        break;
                    }
                    None => {
                        debug!("Session {} closed by peer", generation);
                        break;
                    }
                },
            }
        }

        self.handle_close(generation);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
