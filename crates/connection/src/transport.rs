//! One live connection attempt and the task that drives it.
//!
//! Each transport runs in its own task: connect, emit `Open`, pump frames
//! until the connection ends, then hand control back to the manager's close
//! handler before `Close` reaches the listeners.
//!
//! Events are delivered through [`Shared::dispatch_from`], so nothing from a
//! transport reaches listeners once a newer transport has emitted `Open`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ConnectionError;
use crate::manager::Shared;
use crate::pumps::{ping::ping_pump, read::read_pump, write::write_pump};
use crate::types::{CloseInfo, ConnectionEvent, Payload};

/// Manager-side handle of a transport.
pub(crate) struct Transport {
    pub(crate) generation: u64,
    /// Set once the connector resolved and `Open` was emitted.
    pub(crate) open: bool,
    outbound: mpsc::UnboundedSender<tungstenite::Message>,
    cancel: CancellationToken,
}

impl Transport {
    /// Creates the handle and spawns the driving task. Must be called from
    /// within a Tokio runtime.
    pub(crate) fn spawn(shared: &Arc<Shared>, generation: u64) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(drive(
            shared.clone(),
            generation,
            outbound.clone(),
            outbound_rx,
            cancel.clone(),
        ));
        Self {
            generation,
            open: false,
            outbound,
            cancel,
        }
    }

    /// Queues a payload. Frames queued before the transport opens are
    /// flushed once it does.
    pub(crate) fn send(&self, payload: Payload) -> Result<(), ConnectionError> {
        self.outbound
            .send(payload.into_ws())
            .map_err(|_| ConnectionError::NoConnection)
    }

    /// Initiates teardown. The close handshake completes in the background.
    pub(crate) fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive(
    shared: Arc<Shared>,
    generation: u64,
    outbound: mpsc::UnboundedSender<tungstenite::Message>,
    outbound_rx: mpsc::UnboundedReceiver<tungstenite::Message>,
    cancel: CancellationToken,
) {
    let connect = shared.connector.connect(&shared.url);
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = connect => Some(result),
    };

    let close = match outcome {
        None => CloseInfo::abnormal("closed before the connection opened"),
        Some(Err(e)) => {
            warn!(url = %shared.url, generation, error = %e, "connection attempt failed");
            shared.dispatch_from(generation, &ConnectionEvent::Error(e.to_string()));
            CloseInfo::abnormal(e.to_string())
        }
        Some(Ok(_)) if !shared.handle_open(generation) => {
            // Superseded while the handshake was in flight.
            debug!(generation, "dropping connection opened after teardown");
            CloseInfo::local()
        }
        Some(Ok((sink, stream))) => {
            info!(url = %shared.url, generation, "connection open");
            shared.dispatch_from(generation, &ConnectionEvent::Open);

            let mut write = tokio::spawn(write_pump(sink, outbound_rx, cancel.clone()));
            let ping = tokio::spawn(ping_pump(
                outbound.clone(),
                shared.config.ping_period,
                cancel.clone(),
            ));

            let close = read_pump(
                stream,
                |event: &ConnectionEvent| {
                    shared.dispatch_from(generation, event);
                },
                outbound.clone(),
                shared.config.pong_wait,
                cancel.clone(),
            )
            .await;

            // Stop the other pumps; the write pump sends our close frame.
            cancel.cancel();
            let close_timeout = shared.config.close_timeout;
            if tokio::time::timeout(close_timeout, &mut write).await.is_err() {
                warn!(
                    generation,
                    timeout_ms = close_timeout.as_millis() as u64,
                    "close handshake stalled, dropping the socket"
                );
                write.abort();
            }
            let _ = ping.await;
            close
        }
    };

    info!(
        generation,
        code = ?close.code,
        reason = %close.reason,
        clean = close.clean,
        "connection closed"
    );
    shared.handle_close(generation);
    shared.dispatch_from(generation, &ConnectionEvent::Close(close));
}
