//! WebSocket connector.
//!
//! A [`Connector`] turns a URL into a framed duplex: a sink for outbound
//! messages and a stream of inbound ones. The manager only ever talks to
//! this seam, so tests can hand it in-memory channels instead of sockets.

use std::pin::Pin;

use futures_util::future::BoxFuture;
use futures_util::{Sink, Stream, StreamExt};
use tokio_tungstenite::tungstenite;
use tracing::debug;

use crate::error::TransportError;

/// Outbound half of a transport.
pub type FrameSink = Pin<Box<dyn Sink<tungstenite::Message, Error = tungstenite::Error> + Send>>;

/// Inbound half of a transport.
pub type FrameStream =
    Pin<Box<dyn Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Send>>;

/// Opens transports for the manager.
pub trait Connector: Send + Sync + 'static {
    /// Establishes a connection to `url`. Resolves once the connection is
    /// open (for WebSockets: once the upgrade handshake completed).
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>>;
}

/// [`Connector`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    max_message_size: usize,
}

impl WsConnector {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<(FrameSink, FrameStream), TransportError>> {
        let url = url.to_owned();
        let max = self.max_message_size;
        Box::pin(async move {
            let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
            ws_config.max_message_size = Some(max);
            ws_config.max_frame_size = Some(max);
            let (ws_stream, response) =
                tokio_tungstenite::connect_async_with_config(url.as_str(), Some(ws_config), false)
                    .await?;
            debug!(url = %url, status = %response.status(), "WebSocket handshake complete");
            let (write, read) = ws_stream.split();
            let sink: FrameSink = Box::pin(write);
            let stream: FrameStream = Box::pin(read);
            Ok((sink, stream))
        })
    }
}
