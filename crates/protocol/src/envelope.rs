//! Text-frame encoding and decoding.

use crate::messages::{ClientFrame, ServerFrame};

/// Errors from decoding or encoding a wire frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Bad JSON, unknown frame type, missing fields or a bad timestamp.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Binary frames are not part of the chat protocol.
    #[error("unexpected binary frame ({0} bytes)")]
    Binary(usize),
}

impl ClientFrame {
    /// Serializes the frame to its JSON text form.
    pub fn encode(&self) -> Result<String, FrameError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerFrame {
    /// Decodes a text frame received from the server.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}
