pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::FrameError;
pub use messages::{
    ChatMessage, ClientFrame, NameAvailability, RoomNotice, ServerFrame, ServerMessage,
};
pub use types::{MessageId, RoomAction};
