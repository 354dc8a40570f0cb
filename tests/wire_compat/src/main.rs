fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::{Local, NaiveDate, TimeZone, Utc};
    use parley_protocol::{
        ClientFrame, FrameError, MessageId, NameAvailability, RoomAction, ServerFrame,
        ServerMessage,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file as raw text.
    fn load_raw(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&load_raw(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
    }

    /// Decodes a server fixture the way the client does.
    fn decode_server(name: &str) -> ServerMessage {
        let ServerFrame::Message(msg) = ServerFrame::decode(&load_raw(name))
            .unwrap_or_else(|e| panic!("failed to decode {name}: {e}"));
        msg
    }

    // --- Client frames ---

    #[test]
    fn fixture_identify() {
        roundtrip_test::<ClientFrame>("identify.json");
    }

    #[test]
    fn fixture_send() {
        roundtrip_test::<ClientFrame>("send.json");
    }

    #[test]
    fn encoder_matches_fixture() {
        let encoded = ClientFrame::send("hello, room").encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, load_fixture("send.json"));
    }

    // --- REST ---

    #[test]
    fn fixture_check_name() {
        roundtrip_test::<NameAvailability>("check_name.json");
    }

    // --- Server frames ---

    #[test]
    fn fixture_chat_message_int_id() {
        roundtrip_test::<ServerFrame>("chat_message_int_id.json");

        let ServerMessage::Chat(chat) = decode_server("chat_message_int_id.json") else {
            panic!("expected chat line");
        };
        assert_eq!(chat.id, MessageId::Number(17));
        assert_eq!(
            chat.time,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 5).unwrap()
        );
    }

    #[test]
    fn fixture_chat_message_server_format() {
        let ServerMessage::Chat(chat) = decode_server("chat_message_server_format.json") else {
            panic!("expected chat line");
        };
        assert_eq!(
            chat.id,
            MessageId::Text("3f0c6c9e-2b8e-4c53-9d7a-1f2e4b6a9c10".into())
        );
        assert_eq!(chat.user, "bob");
        assert_eq!(chat.usercolor, "rebeccapurple");
        assert_eq!(chat.message, "hi ana");
        // The server sends its local wall-clock time without an offset.
        let wall = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_micro_opt(10, 0, 5, 123_456))
            .unwrap();
        assert_eq!(chat.time.with_timezone(&Local).naive_local(), wall);
    }

    #[test]
    fn fixture_room_join() {
        let ServerMessage::Room(notice) = decode_server("room_join.json") else {
            panic!("expected room notice");
        };
        assert_eq!(notice.user, "ana");
        assert_eq!(notice.action, RoomAction::Join);
    }

    #[test]
    fn fixture_room_leave() {
        let ServerMessage::Room(notice) = decode_server("room_leave.json") else {
            panic!("expected room notice");
        };
        assert_eq!(notice.action, RoomAction::Leave);
    }

    // --- Malformed input ---

    #[test]
    fn fixture_unknown_type_is_rejected() {
        let err = ServerFrame::decode(&load_raw("malformed_unknown_type.json")).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn fixture_bad_time_is_rejected() {
        let err = ServerFrame::decode(&load_raw("malformed_bad_time.json")).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }
}
