//! Self-healing connection to the chat server.
//!
//! Provides the [`ConnectionManager`] (lifecycle state machine, listener
//! registry, retry timer) on top of a `tokio-tungstenite` WebSocket.

pub mod error;
pub mod listeners;
pub mod manager;
mod pumps;
pub(crate) mod reconnection;
mod transport;
pub mod types;
pub mod ws_client;

pub use error::{ConnectionError, TransportError};
pub use listeners::{Listener, listener};
pub use manager::ConnectionManager;
pub use types::{
    Backoff, CloseInfo, ConnectionConfig, ConnectionEvent, ConnectionState, EventKind, Payload,
    RetryPolicy,
};
pub use ws_client::{Connector, FrameSink, FrameStream, WsConnector};
