//! Session keepalive.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::protocol::ping_frame;

/// A running keepalive.
///
/// Sends one ping frame per interval, the first one interval after start.
/// The task is stopped when the guard is dropped, so a keepalive can never
/// outlive the session state that owns it.
pub(crate) struct KeepaliveGuard {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl KeepaliveGuard {
    pub(crate) fn start(interval: Duration, writer: mpsc::UnboundedSender<String>) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        trace!("keepalive ping");
                        if writer.send(ping_frame()).is_err() {
                            break;
                        }
                    }
                }
            }

            debug!("Keepalive stopped");
        });

        Self { token, task }
    }
}

impl Drop for KeepaliveGuard {
    fn drop(&mut self) {
        self.token.cancel();
        self.task.abort();
    }
}
