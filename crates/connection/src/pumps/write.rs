//! WebSocket write pump: serialises outbound messages.

use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message, Utf8Bytes};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Reason sent in the close frame when the client hangs up.
const CLIENT_CLOSE_REASON: &str = "closed by client";

/// Writes queued frames in order until cancelled or the queue closes.
///
/// On the way out, frames still queued are flushed and a normal close frame
/// follows them. A failed write ends the pump without a close frame.
pub(crate) async fn write_pump<S>(
    mut sink: S,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = outbound.recv() => next,
        };
        let Some(frame) = next else { break };
        if write_frame(&mut sink, frame).await.is_err() {
            return;
        }
    }

    outbound.close();
    while let Ok(frame) = outbound.try_recv() {
        if write_frame(&mut sink, frame).await.is_err() {
            return;
        }
    }

    let close = CloseFrame {
        code: CloseCode::Normal,
        reason: Utf8Bytes::from_static(CLIENT_CLOSE_REASON),
    };
    if let Err(e) = sink.send(Message::Close(Some(close))).await {
        debug!(error = %e, "close frame not delivered");
    }
}

async fn write_frame<S>(sink: &mut S, frame: Message) -> Result<(), tungstenite::Error>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    trace!(len = frame.len(), "writing frame");
    sink.send(frame).await.inspect_err(|e| {
        warn!(error = %e, "websocket write failed");
    })
}
