//! Client assembly.
//!
//! [`LinkClient`] wires one session, one handshake controller and one
//! bridge together and installs the bridge listener. It is the owner of the
//! session: dropping the client tears the session down, which is how a
//! reload starts from scratch.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::bridge::{ConnectRequest, LinkBridge, LinkListener, SendRequest};
use crate::error::LinkError;
use crate::handshake::HandshakeController;
use crate::notify::Notifier;
use crate::reload::{Reloader, DEFAULT_RELOAD_DELAY};
use crate::session::{Session, DEFAULT_KEEPALIVE_INTERVAL};
use crate::transport::{AuthProbe, SocketConnector};

/// Timing knobs of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub keepalive_interval: Duration,
    pub reload_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            reload_delay: DEFAULT_RELOAD_DELAY,
        }
    }
}

/// Bridge listener routing intents to the handshake controller and session.
struct SessionListener {
    controller: Arc<HandshakeController>,
    session: Arc<Session>,
}

impl LinkListener for SessionListener {
    fn on_connect(&self, request: ConnectRequest) {
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let outcome = controller
                .connect_from_location(&request.location, request.on_message)
                .await;
            debug!("Handshake from {} ended: {:?}", request.location, outcome);
        });
    }

    fn on_send(&self, request: SendRequest) -> Result<(), LinkError> {
        self.session.send(request.data)
    }
}

/// A fully wired device link.
pub struct LinkClient {
    bridge: LinkBridge,
    session: Arc<Session>,
}

impl LinkClient {
    pub fn new(
        location: Url,
        connector: Arc<dyn SocketConnector>,
        probe: Arc<dyn AuthProbe>,
        notifier: Arc<dyn Notifier>,
        reloader: Arc<dyn Reloader>,
        timing: SessionTiming,
    ) -> Result<Self, LinkError> {
        let session = Session::new(connector, timing.keepalive_interval);
        let controller = Arc::new(HandshakeController::new(
            session.clone(),
            probe,
            notifier,
            reloader,
            timing.reload_delay,
        ));

        let bridge = LinkBridge::new(location);
        bridge.install(Arc::new(SessionListener {
            controller,
            session: session.clone(),
        }))?;

        Ok(Self { bridge, session })
    }

    /// Handle for raising connect and send intents.
    pub fn bridge(&self) -> &LinkBridge {
        &self.bridge
    }

    /// The session, for state queries and event subscriptions.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

impl Drop for LinkClient {
    fn drop(&mut self) {
        self.session.reset();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
