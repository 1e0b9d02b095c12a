//! Live link between a client and an embedded device's web interface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  connect / send   ┌──────────────┐  GET /auth  ┌──────────┐
//! │  UI / CLI    │ ────────────────► │  LinkBridge  │ ──────────► │          │
//! │  consumers   │                   └──────┬───────┘             │  Device  │
//! │              │ ◄── on_message ──┐       ▼                     │          │
//! └──────────────┘                  │ ┌──────────────┐   /ws      │          │
//!                                   └─│   Session    │ ◄────────► │          │
//!                                     └──────────────┘            └──────────┘
//! ```
//!
//! 1. [`LinkBridge::connect`] hands the page location to the
//!    [`HandshakeController`], which picks the device root from it.
//! 2. The controller probes `{root}/auth`. A 200 opens the [`Session`] on
//!    `{root}/ws`; any other answer, or no answer at all, notifies the user
//!    and schedules a full reload through the [`Reloader`].
//! 3. Once the socket is open the session pings every five seconds until
//!    the socket closes. [`LinkBridge::send`] writes to the socket, or fails
//!    with [`LinkError::NotConnected`] when there is none.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use devlink_core::{
//!     HttpAuthProbe, LinkClient, NotificationBoard, ReloadScheduler, SessionTiming, WsConnector,
//! };
//!
//! # async fn run() -> Result<(), devlink_core::LinkError> {
//! let (reloader, mut reloads) = ReloadScheduler::new();
//! let client = LinkClient::new(
//!     url::Url::parse("http://espurna.local/").unwrap(),
//!     Arc::new(WsConnector),
//!     Arc::new(HttpAuthProbe::new()),
//!     Arc::new(NotificationBoard::stderr()),
//!     Arc::new(reloader),
//!     SessionTiming::default(),
//! )?;
//!
//! client.bridge().connect(|text| println!("{}", text))?;
//! reloads.recv().await;
//! # Ok(())
//! # }
//! ```

mod bridge;
mod client;
mod endpoints;
mod error;
mod handshake;
mod keepalive;
mod notify;
mod protocol;
mod reload;
mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use bridge::{ConnectRequest, LinkBridge, LinkListener, SendRequest};
pub use client::{LinkClient, SessionTiming};
pub use endpoints::{resolve_root, EndpointSet};
pub use error::LinkError;
pub use handshake::{HandshakeController, HandshakeOutcome};
pub use notify::{format_error, Notification, NotificationBoard, Notifier};
pub use protocol::{Action, PING_ACTION};
pub use reload::{ReloadRequest, ReloadScheduler, Reloader, DEFAULT_RELOAD_DELAY};
pub use session::{MessageHandler, Session, SessionEvent, DEFAULT_KEEPALIVE_INTERVAL};
pub use transport::{AuthProbe, AuthResponse, HttpAuthProbe, SocketConnector, WsConnector};
