//! WebSocket read pump: turns inbound frames into listener events.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::types::{CloseInfo, ConnectionEvent, Payload};

/// Reads frames until the transport ends and reports how it ended.
///
/// Text and binary frames are emitted as `Message` events, read errors as
/// `Error` events. Any inbound frame resets the `pong_wait` deadline; if
/// nothing arrives in time the connection is considered dead.
pub(crate) async fn read_pump<S, F>(
    mut read: S,
    emit: F,
    write_tx: mpsc::UnboundedSender<tungstenite::Message>,
    pong_wait: Duration,
    cancel: CancellationToken,
) -> CloseInfo
where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
    F: Fn(&ConnectionEvent),
{
    let pong_deadline = tokio::time::sleep(pong_wait);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return CloseInfo::local(),

            () = &mut pong_deadline => {
                warn!("no traffic within {}s, connection dead", pong_wait.as_secs());
                return CloseInfo::abnormal("pong timeout");
            }

            msg = read.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        emit(&ConnectionEvent::Error(e.to_string()));
                        return CloseInfo::abnormal(e.to_string());
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        return CloseInfo::abnormal("stream ended");
                    }
                };

                pong_deadline.as_mut().reset(tokio::time::Instant::now() + pong_wait);

                match msg {
                    tungstenite::Message::Text(text) => {
                        let text: &str = &text;
                        trace!(len = text.len(), "received text frame");
                        emit(&ConnectionEvent::Message(Payload::Text(text.to_owned())));
                    }
                    tungstenite::Message::Binary(data) => {
                        trace!(len = data.len(), "received binary frame");
                        emit(&ConnectionEvent::Message(Payload::Binary(data.to_vec())));
                    }
                    tungstenite::Message::Ping(data) => {
                        trace!("received ping, sending pong");
                        let _ = write_tx.send(tungstenite::Message::Pong(data));
                    }
                    tungstenite::Message::Pong(_) => {
                        trace!("received pong");
                    }
                    tungstenite::Message::Close(frame) => {
                        debug!(?frame, "received close frame");
                        return match frame {
                            Some(f) => {
                                let reason: &str = &f.reason;
                                CloseInfo {
                                    code: Some(u16::from(f.code)),
                                    reason: reason.to_owned(),
                                    clean: true,
                                }
                            }
                            None => CloseInfo {
                                code: None,
                                reason: String::new(),
                                clean: true,
                            },
                        };
                    }
                    tungstenite::Message::Frame(_) => {}
                }
            }
        }
    }
}
