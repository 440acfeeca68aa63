//! Core types for the sans-io Warhorse implementation.

use serde_json::Value;
use std::fmt;

/// Data to be written to the transport.
///
/// The session state machine produces `Transmit` objects via `poll_transmit()`.
/// The caller is responsible for actually sending this data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    /// The request method, kept for logging
    pub method: &'static str,
    /// Payload to send (null-terminated JSON)
    pub payload: Vec<u8>,
}

impl Transmit {
    pub fn new(method: &'static str, payload: Vec<u8>) -> Self {
        Self { method, payload }
    }
}

/// Result of scanning a byte buffer for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// A complete frame was found
    Complete {
        /// The frame bytes (without null terminator)
        message: Vec<u8>,
        /// Number of bytes consumed from input (including null terminator)
        consumed: usize,
    },
    /// No terminator yet
    Incomplete,
    /// A terminated frame that cannot be JSON
    Invalid {
        /// Description of the problem
        error: String,
        /// Number of bytes to skip to resynchronize
        consumed: usize,
    },
}

/// One terminated frame taken off the transport, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    /// JSON text, without the terminator
    Message(Vec<u8>),
    /// Terminated bytes that failed basic validation
    Invalid(String),
}

/// The kinds of event a server can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Hello,
    LoggedIn,
    Error,
    FriendRequests,
    FriendsList,
    BlockedList,
    FriendRequestAccepted,
    ChatMessage,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Hello,
        EventKind::LoggedIn,
        EventKind::Error,
        EventKind::FriendRequests,
        EventKind::FriendsList,
        EventKind::BlockedList,
        EventKind::FriendRequestAccepted,
        EventKind::ChatMessage,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EventKind::Hello => "hello",
            EventKind::LoggedIn => "logged-in",
            EventKind::Error => "error",
            EventKind::FriendRequests => "friend-requests",
            EventKind::FriendsList => "friends-list",
            EventKind::BlockedList => "blocked-list",
            EventKind::FriendRequestAccepted => "friend-request-accepted",
            EventKind::ChatMessage => "chat-message",
        };
        f.write_str(name)
    }
}

/// A server notification, as delivered to the embedder.
///
/// The payload is the JSON the server sent, forwarded as text. Interpreting
/// it (friend lists, chat messages, ...) is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    payload: String,
}

impl Event {
    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        Event {
            kind,
            payload: payload.into(),
        }
    }

    /// An `Error` event carrying a diagnostic message produced by the client itself.
    pub(crate) fn diagnostic(message: impl fmt::Display) -> Self {
        Event::new(
            EventKind::Error,
            Value::String(message.to_string()).to_string(),
        )
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Parse the payload as JSON.
    pub fn payload_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.payload)
    }
}

/// A server-to-client frame, after JSON decoding.
#[derive(Deserialize, Debug, PartialEq)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// A client-to-server request frame.
#[derive(Serialize, Debug, PartialEq)]
pub struct Request<'a> {
    pub method: &'a str,
    pub parameters: Value,
}
