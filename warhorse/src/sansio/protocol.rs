//! Pure frame parsing, decoding and serialization.
//!
//! Frames are null-terminated JSON documents. Nothing in here performs I/O.

use super::types::{Event, EventKind, InboundFrame, ParseResult, Request};
use crate::proto::*;
use serde_json::Value;

/// Scan `buf` for one null-terminated frame.
///
/// # Example
///
/// ```
/// use warhorse::sansio::protocol::parse_message;
/// use warhorse::sansio::types::ParseResult;
///
/// let buf = b"{\"event\":\"/hello\"}\0";
/// match parse_message(buf) {
///     ParseResult::Complete { message, consumed } => {
///         assert_eq!(consumed, buf.len());
///         assert_eq!(message, b"{\"event\":\"/hello\"}");
///     }
///     _ => panic!("Expected complete message"),
/// }
/// ```
pub fn parse_message(buf: &[u8]) -> ParseResult {
    let pos = match buf.iter().position(|&b| b == 0) {
        Some(pos) => pos,
        None => return ParseResult::Incomplete,
    };
    let consumed = pos + 1;
    let message = &buf[..pos];

    let text = match std::str::from_utf8(message) {
        Ok(s) => s,
        Err(_) => {
            return ParseResult::Invalid {
                error: "Message is not valid UTF-8".to_string(),
                consumed,
            }
        }
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ParseResult::Invalid {
            error: "Empty message".to_string(),
            consumed,
        };
    }
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return ParseResult::Invalid {
            error: format!("Message does not look like JSON: {}", trimmed),
            consumed,
        };
    }

    ParseResult::Complete {
        message: message.to_vec(),
        consumed,
    }
}

/// Map a server discriminant onto its event kind.
pub fn event_kind(discriminant: &str) -> Option<EventKind> {
    let kind = match discriminant {
        EVENT_HELLO => EventKind::Hello,
        EVENT_LOGGED_IN => EventKind::LoggedIn,
        EVENT_ERROR => EventKind::Error,
        EVENT_FRIEND_REQUESTS => EventKind::FriendRequests,
        EVENT_FRIENDS => EventKind::FriendsList,
        EVENT_BLOCKED_USERS => EventKind::BlockedList,
        EVENT_FRIEND_REQUEST_ACCEPTED => EventKind::FriendRequestAccepted,
        EVENT_CHAT_MESSAGE => EventKind::ChatMessage,
        _ => return None,
    };
    Some(kind)
}

/// Decode one complete frame into an event.
///
/// On failure the description is meant for a diagnostic `Error` event;
/// neither malformed JSON nor an unknown discriminant ends the session.
pub fn decode_frame(message: &[u8]) -> Result<Event, String> {
    let frame: InboundFrame =
        serde_json::from_slice(message).map_err(|e| format!("Malformed frame: {}", e))?;

    match event_kind(&frame.event) {
        Some(kind) => Ok(Event::new(kind, frame.payload.to_string())),
        None => Err(format!("Unknown event '{}'", frame.event)),
    }
}

/// Serialize a request to bytes with null terminator.
///
/// ```
/// use warhorse::sansio::protocol::serialize_request;
///
/// let bytes = serialize_request("/user/logout", serde_json::json!({})).unwrap();
/// assert!(bytes.ends_with(&[0]));
/// ```
pub fn serialize_request(method: &str, parameters: Value) -> serde_json::Result<Vec<u8>> {
    let request = Request { method, parameters };
    let mut bytes = serde_json::to_vec(&request)?;
    bytes.push(0);
    Ok(bytes)
}

/// Serialize a server event frame. Used by test servers and tools that
/// replay traffic.
pub fn serialize_event(discriminant: &str, payload: Value) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(&serde_json::json!({
        "event": discriminant,
        "payload": payload,
    }))?;
    bytes.push(0);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_incomplete_message() {
        let buf = b"{\"event\":\"/hello\"}";
        assert_eq!(parse_message(buf), ParseResult::Incomplete);
    }

    #[test]
    fn test_parse_empty_message() {
        match parse_message(b"\0") {
            ParseResult::Invalid { consumed, .. } => assert_eq!(consumed, 1),
            other => panic!("Expected invalid message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_json() {
        match parse_message(b"not json\0{}") {
            ParseResult::Invalid { consumed, .. } => assert_eq!(consumed, 9),
            other => panic!("Expected invalid message, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_utf8() {
        assert!(matches!(
            parse_message(b"{\xff}\0"),
            ParseResult::Invalid { .. }
        ));
    }

    #[test]
    fn test_parse_with_extra_data() {
        let buf = b"{\"event\":\"/hello\"}\0{\"event\":";
        match parse_message(buf) {
            ParseResult::Complete { message, consumed } => {
                assert_eq!(consumed, 19);
                assert_eq!(message, b"{\"event\":\"/hello\"}");
            }
            other => panic!("Expected complete message, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_known_events() {
        let event =
            decode_frame(br#"{"event":"/friends/receive","payload":[{"id":"1"}]}"#).unwrap();
        assert_eq!(event.kind(), EventKind::FriendsList);
        assert_eq!(event.payload(), r#"[{"id":"1"}]"#);

        let event = decode_frame(br#"{"event":"/hello"}"#).unwrap();
        assert_eq!(event.kind(), EventKind::Hello);
        assert_eq!(event.payload(), "null");
    }

    #[test]
    fn test_decode_every_discriminant() {
        let pairs = [
            (EVENT_HELLO, EventKind::Hello),
            (EVENT_LOGGED_IN, EventKind::LoggedIn),
            (EVENT_ERROR, EventKind::Error),
            (EVENT_FRIEND_REQUESTS, EventKind::FriendRequests),
            (EVENT_FRIENDS, EventKind::FriendsList),
            (EVENT_BLOCKED_USERS, EventKind::BlockedList),
            (EVENT_FRIEND_REQUEST_ACCEPTED, EventKind::FriendRequestAccepted),
            (EVENT_CHAT_MESSAGE, EventKind::ChatMessage),
        ];
        for (discriminant, kind) in pairs {
            assert_eq!(event_kind(discriminant), Some(kind));
        }
        assert_eq!(event_kind("/rooms/receive"), None);
    }

    #[test]
    fn test_decode_unknown_event() {
        let error = decode_frame(br#"{"event":"/rooms/receive","payload":{}}"#).unwrap_err();
        assert!(error.contains("/rooms/receive"));
    }

    #[test]
    fn test_decode_malformed() {
        let error = decode_frame(br#"{"payload":1}"#).unwrap_err();
        assert!(error.starts_with("Malformed frame"));
    }

    #[test]
    fn test_serialize_request() {
        let bytes = serialize_request(METHOD_USER_LOGOUT, serde_json::json!({"language": "English"}))
            .unwrap();
        match parse_message(&bytes) {
            ParseResult::Complete { message, consumed } => {
                assert_eq!(consumed, bytes.len());
                let value: Value = serde_json::from_slice(&message).unwrap();
                assert_eq!(value["method"], "/user/logout");
                assert_eq!(value["parameters"]["language"], "English");
            }
            other => panic!("Failed to parse serialized request: {:?}", other),
        }
    }
}
