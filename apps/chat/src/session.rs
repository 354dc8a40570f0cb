//! Chat session state driven by connection events and user input.
//!
//! The session never touches the network itself; it returns [`Effect`]s
//! for the main loop to carry out.

use chrono::Local;
use parley_connection::{ConnectionEvent, Payload};
use parley_protocol::{
    ChatMessage, ClientFrame, FrameError, RoomAction, RoomNotice, ServerFrame, ServerMessage,
};
use tracing::{debug, warn};

/// Line shown while no connection is open.
pub const CONNECTING_NOTICE: &str = "Connecting...";

/// Work requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Transmit a frame to the server.
    Send(ClientFrame),
    /// Print a line to the chat log.
    Print(String),
}

pub struct ChatSession {
    username: String,
    connected: bool,
    history: Vec<ServerMessage>,
}

impl ChatSession {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            connected: false,
            history: Vec::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Messages received so far, oldest first.
    pub fn history(&self) -> &[ServerMessage] {
        &self.history
    }

    pub fn handle_event(&mut self, event: &ConnectionEvent) -> Vec<Effect> {
        match event {
            ConnectionEvent::Open => {
                self.connected = true;
                vec![
                    Effect::Send(ClientFrame::identify(self.username.clone())),
                    Effect::Print(format!("connected as {}", self.username)),
                ]
            }
            ConnectionEvent::Close(info) => {
                debug!(code = ?info.code, reason = %info.reason, "connection closed");
                if !self.connected {
                    return Vec::new();
                }
                self.connected = false;
                vec![Effect::Print(CONNECTING_NOTICE.into())]
            }
            ConnectionEvent::Error(e) => {
                debug!(error = %e, "connection error");
                Vec::new()
            }
            ConnectionEvent::Message(payload) => match decode(payload) {
                Ok(ServerFrame::Message(msg)) => {
                    let line = render(&msg);
                    self.history.push(msg);
                    vec![Effect::Print(line)]
                }
                Err(e) => {
                    warn!(error = %e, "dropping malformed frame");
                    Vec::new()
                }
            },
        }
    }

    /// Turns a typed line into a send. Blank lines are ignored.
    pub fn handle_input(&mut self, line: &str) -> Option<Effect> {
        let text = line.trim();
        if text.is_empty() {
            return None;
        }
        if !self.connected {
            return Some(Effect::Print(
                "not connected, message not sent".into(),
            ));
        }
        Some(Effect::Send(ClientFrame::send(text)))
    }
}

fn decode(payload: &Payload) -> Result<ServerFrame, FrameError> {
    match payload.as_text() {
        Some(text) => ServerFrame::decode(text),
        None => Err(FrameError::Binary(payload.len())),
    }
}

/// Formats one server message as a log line.
pub fn render(msg: &ServerMessage) -> String {
    match msg {
        ServerMessage::Chat(chat) => render_chat(chat),
        ServerMessage::Room(notice) => render_notice(notice),
    }
}

fn render_chat(chat: &ChatMessage) -> String {
    format!(
        "[{}] {}: {}",
        chat.time.with_timezone(&Local).format("%H:%M:%S"),
        chat.user,
        chat.message
    )
}

fn render_notice(notice: &RoomNotice) -> String {
    let verb = match notice.action {
        RoomAction::Join => "joined",
        RoomAction::Leave => "left",
    };
    format!("* {} {verb}", notice.user)
}
