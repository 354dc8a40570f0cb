//! Error types for the connection manager.

use tokio_tungstenite::tungstenite;

/// Errors returned to callers of the manager.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// `send` was called while no transport exists.
    #[error("attempt to send data without connection")]
    NoConnection,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures of a single transport. Never returned from the public API;
/// they surface as `Error` and `Close` events.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("connection closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ConnectionError::NoConnection.to_string(),
            "attempt to send data without connection"
        );
        assert_eq!(TransportError::Closed.to_string(), "connection closed");

        let err = TransportError::from(tungstenite::Error::ConnectionClosed);
        assert!(err.to_string().starts_with("WebSocket error"));
    }
}
