use std::time::Duration;

/// Path of the chat WebSocket endpoint on the server.
pub const CHAT_WS_PATH: &str = "/api/chat-ws";

/// Path of the username availability check.
pub const CHECK_NAME_PATH: &str = "/api/check-name";

/// Delay between a dropped connection and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// How often to send keepalive pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(20);

/// Time to wait for any inbound traffic (pong, chat frame, anything)
/// before the connection is considered dead.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How long a closing transport may spend flushing its queue and sending
/// the close frame before it is abandoned.
pub const WS_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum inbound message size in bytes (1 MB). Chat lines are tiny;
/// anything bigger is a misbehaving peer.
pub const WS_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Builds the chat WebSocket URL for a `host[:port]`.
pub fn chat_ws_url(host: &str) -> String {
    format!("ws://{host}{CHAT_WS_PATH}")
}

/// Builds the base URL of the name check endpoint for a `host[:port]`.
///
/// The `username` query parameter is appended by the HTTP client.
pub fn check_name_url(host: &str) -> String {
    format!("http://{host}{CHECK_NAME_PATH}")
}
