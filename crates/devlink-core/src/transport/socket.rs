//! WebSocket session transport.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use crate::error::LinkError;

/// Outbound half of an open socket: accepts text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = LinkError> + Send>>;

/// Inbound half of an open socket: yields text frames until the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, LinkError>> + Send>>;

/// Opens text-frame sockets.
///
/// `connect` resolves once the transport acknowledges the open; the session
/// treats that moment as the transition into the connected state.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<(FrameSink, FrameStream), LinkError>;
}

/// [`SocketConnector`] backed by tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl SocketConnector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<(FrameSink, FrameStream), LinkError> {
        debug!("Opening WebSocket to {}", url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (ws_sink, ws_source) = ws_stream.split();

        let sink = ws_sink
            .sink_map_err(LinkError::from)
            .with(|text: String| future::ready(Ok::<_, LinkError>(Message::Text(text.into()))));

        // Binary, ping and pong frames are not part of the link protocol.
        let stream = ws_source
            .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(|frame| {
                future::ready(match frame {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(_) => None,
                    Err(e) => Some(Err(LinkError::from(e))),
                })
            });

        debug!("WebSocket open: {}", url);
        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
