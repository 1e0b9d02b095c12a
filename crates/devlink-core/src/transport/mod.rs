//! Transport seams.
//!
//! The link needs exactly two things from the network: an HTTP GET for the
//! handshake and a text-frame WebSocket for the session. Both sit behind
//! traits so the session and handshake logic can run against in-memory
//! doubles.

mod auth;
mod socket;

pub use auth::{AuthProbe, AuthResponse, HttpAuthProbe};
pub use socket::{FrameSink, FrameStream, SocketConnector, WsConnector};
