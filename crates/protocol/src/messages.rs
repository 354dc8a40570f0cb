use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, RoomAction};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Announces the user's name. Sent once, right after the socket opens.
    Identify { username: String },
    /// One outgoing chat line.
    Send { message: String },
}

impl ClientFrame {
    pub fn identify(username: impl Into<String>) -> Self {
        ClientFrame::Identify {
            username: username.into(),
        }
    }

    pub fn send(message: impl Into<String>) -> Self {
        ClientFrame::Send {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Frames pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Message(ServerMessage),
}

/// Body of a `"type": "message"` frame.
///
/// Chat lines carry a timestamp and a color; room notices carry an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Chat(ChatMessage),
    Room(RoomNotice),
}

/// A chat line broadcast by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    #[serde(with = "crate::types::wire_time")]
    pub time: DateTime<Utc>,
    pub user: String,
    /// CSS color name or value assigned to the author.
    pub usercolor: String,
    pub message: String,
}

/// Join/leave notice for the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomNotice {
    pub id: MessageId,
    pub user: String,
    pub action: RoomAction,
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

/// Response of `GET /api/check-name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAvailability {
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn identify_wire_shape() {
        let json = serde_json::to_value(ClientFrame::identify("ana")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "identify", "username": "ana"}));
    }

    #[test]
    fn send_wire_shape() {
        let json = serde_json::to_value(ClientFrame::send("hi there")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "send", "message": "hi there"}));
    }

    #[test]
    fn chat_message_with_integer_id() {
        let raw = r#"{"type":"message","id":7,"time":"2024-05-01T10:00:05Z",
            "user":"bob","usercolor":"teal","message":"hello"}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        let ServerFrame::Message(ServerMessage::Chat(msg)) = frame else {
            panic!("expected chat message");
        };
        assert_eq!(msg.id, MessageId::Number(7));
        assert_eq!(msg.user, "bob");
        assert_eq!(msg.usercolor, "teal");
        assert_eq!(msg.time.second(), 5);
    }

    #[test]
    fn chat_message_ignores_message_type_field() {
        let raw = r#"{"type":"message","message_type":"message","id":"a-1",
            "time":"2024-05-01 10:00:05.250000","user":"bob","usercolor":"navy","message":"yo"}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            frame,
            ServerFrame::Message(ServerMessage::Chat(ChatMessage { ref message, .. })) if message == "yo"
        ));
    }

    #[test]
    fn room_notice_decodes() {
        let raw = r#"{"type":"message","message_type":"room","id":"r-1","user":"eve","action":"join"}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(
            frame,
            ServerFrame::Message(ServerMessage::Room(RoomNotice {
                id: MessageId::Text("r-1".into()),
                user: "eve".into(),
                action: RoomAction::Join,
            }))
        );
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        let raw = r#"{"type":"typing","user":"eve"}"#;
        assert!(serde_json::from_str::<ServerFrame>(raw).is_err());
    }

    #[test]
    fn name_availability() {
        let a: NameAvailability = serde_json::from_str(r#"{"available":false}"#).unwrap();
        assert!(!a.available);
    }
}
