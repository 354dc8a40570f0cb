//! Public types for the connection manager.

use std::fmt;
use std::time::Duration;

use parley_protocol::constants::{
    RECONNECT_DELAY, WS_CLOSE_TIMEOUT, WS_MAX_MESSAGE_SIZE, WS_PING_PERIOD, WS_PONG_WAIT,
};
use tokio_tungstenite::tungstenite;

/// Observable state of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connecting is disabled; no transport, no timer.
    Idle,
    /// A transport exists but has not opened yet.
    Connecting,
    /// The transport is open and frames flow both ways.
    Open,
    /// The last transport closed; a retry timer is pending.
    WaitingToRetry { attempt: u32 },
}

/// The four kinds of events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Close,
    Message,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Open,
        EventKind::Close,
        EventKind::Message,
        EventKind::Error,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Message => "message",
            EventKind::Error => "error",
        })
    }
}

/// A frame body, as sent or received on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the text content, or `None` for binary payloads.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_ws(self) -> tungstenite::Message {
        match self {
            Payload::Text(s) => tungstenite::Message::Text(s.into()),
            Payload::Binary(b) => tungstenite::Message::Binary(b.into()),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Binary(b)
    }
}

/// How a transport ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// Close code from the peer's close frame, if one was received or sent.
    pub code: Option<u16>,
    pub reason: String,
    /// `true` when a close handshake took place.
    pub clean: bool,
}

impl CloseInfo {
    /// Normal closure initiated locally.
    pub(crate) fn local() -> Self {
        Self {
            code: Some(1000),
            reason: "closed by client".into(),
            clean: true,
        }
    }

    /// Abnormal closure (no close frame); the reason is diagnostic only.
    pub(crate) fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
            clean: false,
        }
    }
}

/// Events delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The transport opened.
    Open,
    /// The transport closed (always delivered, also after a failed connect).
    Close(CloseInfo),
    /// A frame arrived from the server.
    Message(Payload),
    /// A transport-level failure; a `Close` follows.
    Error(String),
}

impl ConnectionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConnectionEvent::Open => EventKind::Open,
            ConnectionEvent::Close(_) => EventKind::Close,
            ConnectionEvent::Message(_) => EventKind::Message,
            ConnectionEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Delay curve between reconnection attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay before every attempt.
    Fixed(Duration),
    /// `initial * factor^(attempt-1)`, capped at `max`.
    Exponential {
        initial: Duration,
        factor: f64,
        max: Duration,
    },
}

/// Reconnection policy.
///
/// The default retries forever with a fixed 3 s delay.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub backoff: Backoff,
    /// Give up after this many consecutive failed attempts. `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Backoff::Fixed(RECONNECT_DELAY),
            max_retries: None,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before attempt number `attempt` (1-based), or
    /// `None` if the policy has run out of retries.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if self.max_retries.is_some_and(|max| attempt > max) {
            return None;
        }
        let delay = match &self.backoff {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exp = attempt.saturating_sub(1).min(63) as i32;
                let secs = initial.as_secs_f64() * factor.powi(exp);
                Duration::from_secs_f64(secs.min(max.as_secs_f64()))
            }
        };
        Some(delay)
    }
}

/// Settings for a [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub retry: RetryPolicy,
    /// Interval between keepalive pings on an open transport.
    pub ping_period: Duration,
    /// Silence after which an open transport is considered dead.
    pub pong_wait: Duration,
    /// Largest inbound message accepted by the WebSocket connector.
    pub max_message_size: usize,
    /// Upper bound on the close handshake of an ending transport.
    pub close_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            ping_period: WS_PING_PERIOD,
            pong_wait: WS_PONG_WAIT,
            max_message_size: WS_MAX_MESSAGE_SIZE,
            close_timeout: WS_CLOSE_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_equality() {
        assert_eq!(ConnectionState::Idle, ConnectionState::Idle);
        assert_ne!(ConnectionState::Open, ConnectionState::Connecting);
        assert_eq!(
            ConnectionState::WaitingToRetry { attempt: 1 },
            ConnectionState::WaitingToRetry { attempt: 1 },
        );
        assert_ne!(
            ConnectionState::WaitingToRetry { attempt: 1 },
            ConnectionState::WaitingToRetry { attempt: 2 },
        );
    }

    #[test]
    fn event_kind_matches_event() {
        assert_eq!(ConnectionEvent::Open.kind(), EventKind::Open);
        assert_eq!(
            ConnectionEvent::Close(CloseInfo::local()).kind(),
            EventKind::Close
        );
        assert_eq!(
            ConnectionEvent::Message("x".into()).kind(),
            EventKind::Message
        );
        assert_eq!(ConnectionEvent::Error("e".into()).kind(), EventKind::Error);
        assert_eq!(EventKind::Message.to_string(), "message");
    }

    #[test]
    fn payload_conversions() {
        let p: Payload = "hi".into();
        assert_eq!(p.as_text(), Some("hi"));
        assert_eq!(p.len(), 2);
        let b: Payload = vec![1u8, 2, 3].into();
        assert_eq!(b.as_text(), None);
        assert!(!b.is_empty());
        assert!(matches!(
            Payload::Text("a".into()).into_ws(),
            tungstenite::Message::Text(_)
        ));
    }

    #[test]
    fn retry_policy_default_is_fixed_forever() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(3000)));
        assert_eq!(
            policy.delay_for_attempt(10_000),
            Some(Duration::from_millis(3000))
        );
    }

    #[test]
    fn retry_policy_max_retries() {
        let policy = RetryPolicy {
            max_retries: Some(2),
            ..RetryPolicy::default()
        };
        assert!(policy.delay_for_attempt(1).is_some());
        assert!(policy.delay_for_attempt(2).is_some());
        assert!(policy.delay_for_attempt(3).is_none());
    }

    #[test]
    fn retry_policy_exponential_backoff() {
        let policy = RetryPolicy {
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(250),
                factor: 2.0,
                max: Duration::from_secs(2),
            },
            max_retries: None,
        };
        // 250ms, 500ms, 1s, 2s (capped), 2s...
        let expected = [250, 500, 1000, 2000, 2000];
        for (i, &ms) in expected.iter().enumerate() {
            let delay = policy.delay_for_attempt((i + 1) as u32).unwrap();
            assert_eq!(delay.as_millis(), ms, "attempt {}", i + 1);
        }
    }

    #[test]
    fn connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.ping_period < config.pong_wait);
    }
}
