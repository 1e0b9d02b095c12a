//! Handshake and recovery.
//!
//! A connect attempt probes the device's auth endpoint. A 200 opens the
//! session; anything else, including a request that never completes, is
//! answered the same way: tell the user and schedule a full reload.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::endpoints::{resolve_root, EndpointSet};
use crate::error::LinkError;
use crate::notify::Notifier;
use crate::reload::Reloader;
use crate::session::{MessageHandler, Session};
use crate::transport::AuthProbe;

/// How a connect attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Auth answered 200 and the session is opening.
    Authorized,
    /// Auth answered with another status; a reload is scheduled.
    Rejected { url: Url, status: u16 },
    /// The auth request could not complete; a reload is scheduled.
    Failed,
}

/// Drives the auth check and the recovery policy.
pub struct HandshakeController {
    session: Arc<Session>,
    probe: Arc<dyn AuthProbe>,
    notifier: Arc<dyn Notifier>,
    reloader: Arc<dyn Reloader>,
    reload_delay: Duration,
}

impl HandshakeController {
    pub fn new(
        session: Arc<Session>,
        probe: Arc<dyn AuthProbe>,
        notifier: Arc<dyn Notifier>,
        reloader: Arc<dyn Reloader>,
        reload_delay: Duration,
    ) -> Self {
        Self {
            session,
            probe,
            notifier,
            reloader,
            reload_delay,
        }
    }

    /// Pick the root for a page `location`, then [`connect_to_url`] it.
    ///
    /// A location whose `host` parameter names no usable origin is handled
    /// like a failed request: notify, then reload.
    ///
    /// [`connect_to_url`]: Self::connect_to_url
    pub async fn connect_from_location(
        &self,
        location: &Url,
        on_message: MessageHandler,
    ) -> HandshakeOutcome {
        match resolve_root(location) {
            Ok(root) => self.connect_to_url(&root, on_message).await,
            Err(e) => self.on_fetch_error(e),
        }
    }

    /// Authenticate against `root` and open the session on success.
    ///
    /// Failures are absorbed here: the caller only learns the outcome, it
    /// never has to handle an error.
    pub async fn connect_to_url(&self, root: &Url, on_message: MessageHandler) -> HandshakeOutcome {
        let endpoints = match EndpointSet::resolve(root) {
            Ok(endpoints) => endpoints,
            Err(e) => return self.on_fetch_error(e),
        };

        debug!("Checking auth at {}", endpoints.auth());

        match self.probe.probe(endpoints.auth()).await {
            Ok(response) if response.is_authorized() => {
                info!("Authorized by {}", response.url);
                self.session.open(endpoints, on_message);
                HandshakeOutcome::Authorized
            }
            Ok(response) => {
                let rejected = LinkError::HandshakeRejected {
                    url: response.url.clone(),
                    status: response.status,
                };
                warn!("{}", rejected);
                self.notifier.notify_message(&format!(
                    "{}, reloading the page",
                    rejected
                ));
                self.reloader.reload_in(self.reload_delay);
                HandshakeOutcome::Rejected {
                    url: response.url,
                    status: response.status,
                }
            }
            Err(e) => self.on_fetch_error(e),
        }
    }

    fn on_fetch_error(&self, error: LinkError) -> HandshakeOutcome {
        warn!("Handshake failed: {}", error);
        self.notifier.notify_error(&error);
        self.reloader.reload_in(self.reload_delay);
        HandshakeOutcome::Failed
    }
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
