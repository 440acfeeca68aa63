//! Sans-IO implementation of the Warhorse client protocol.
//!
//! The session state machine never touches a socket. This allows:
//!
//! - Testing the handshake without a server
//! - Driving the session from any transport
//!
//! # Architecture
//!
//! - `Session::handle_frame()`: feed one inbound frame, get the resulting event
//! - `Session::poll_transmit()`: get outgoing requests to write
//! - `protocol::parse_message()`: split a byte stream into frames
//!
//! # Example
//!
//! ```
//! use warhorse::sansio::{parse_message, ParseResult, RawFrame, Session};
//! use warhorse::Language;
//!
//! let mut session = Session::new(Language::English);
//! session.connected();
//!
//! let mut recv_buf = b"{\"event\":\"/hello\"}\0{\"event\":\"/fri".to_vec();
//! while let ParseResult::Complete { message, consumed } = parse_message(&recv_buf) {
//!     recv_buf.drain(..consumed);
//!     let event = session.handle_frame(RawFrame::Message(message));
//!     println!("{}: {}", event.kind(), event.payload());
//! }
//! assert!(session.is_ready_for_login());
//! ```

pub mod protocol;
pub mod session;
pub mod types;

pub use self::protocol::{decode_frame, parse_message, serialize_event, serialize_request};
pub use self::session::{ConnectionState, Session};
pub use self::types::{Event, EventKind, ParseResult, RawFrame, Transmit};
