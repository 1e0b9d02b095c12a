//! Recovery by restart.
//!
//! The link never retries a failed handshake in place. It asks whoever owns
//! the client to throw everything away and start over after a delay.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

/// Default delay between a failed handshake and the reload.
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(5000);

/// Schedules a full client reload.
pub trait Reloader: Send + Sync {
    fn reload_in(&self, delay: Duration);
}

/// A due reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadRequest {
    pub delay: Duration,
}

/// [`Reloader`] that delivers a [`ReloadRequest`] to the client owner once
/// the delay has passed.
#[derive(Debug, Clone)]
pub struct ReloadScheduler {
    tx: mpsc::UnboundedSender<ReloadRequest>,
}

impl ReloadScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReloadRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Reloader for ReloadScheduler {
    fn reload_in(&self, delay: Duration) {
        info!("Reloading in {:?}", delay);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(ReloadRequest { delay }).is_err() {
                debug!("Reload dropped, client already gone");
            }
        });
    }
}
