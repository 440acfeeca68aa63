//! Session state machine for the Warhorse handshake.
//!
//! This module implements the client-side protocol logic without any I/O operations.

use super::protocol::{decode_frame, serialize_request};
use super::types::{Event, EventKind, RawFrame, Transmit};
use crate::error::{ProtocolError, Result, TransportError};
use crate::proto::*;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Session connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport not yet established
    Connecting,
    /// Connected, waiting for the server greeting
    AwaitingHello,
    /// Greeted; a login may be sent and its result is pending
    AwaitingLoginResult,
    /// Logged in
    Authenticated,
    /// Closed by the client
    Closed,
    /// Login rejected or transport lost
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }
}

/// Sans-IO session state machine.
///
/// Contains no I/O code:
///
/// - `connected()`: the transport is up
/// - `send_login()` and friends: queue a request
/// - `handle_frame()`: turn an inbound frame into an event
/// - `poll_transmit()`: get outgoing data to send
///
/// # Example
///
/// ```
/// use warhorse::sansio::{ConnectionState, RawFrame, Session};
/// use warhorse::{Credentials, EventKind, Language};
///
/// let mut session = Session::new(Language::English);
/// session.connected();
///
/// let event = session.handle_frame(RawFrame::Message(br#"{"event":"/hello"}"#.to_vec()));
/// assert_eq!(event.kind(), EventKind::Hello);
/// assert!(session.is_ready_for_login());
///
/// session.send_login(Credentials::new("alice", "pw"))?;
/// assert!(session.poll_transmit().is_some());
/// assert_eq!(session.state(), ConnectionState::AwaitingLoginResult);
/// # Ok::<(), warhorse::Error>(())
/// ```
#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    language: Language,
    /// Set once a login or registration request was queued
    login_sent: bool,
    send_buf: VecDeque<Transmit>,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self {
            state: ConnectionState::Connecting,
            language,
            login_sent: false,
            send_buf: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// True iff the greeting was seen and no login request has been sent.
    pub fn is_ready_for_login(&self) -> bool {
        self.state == ConnectionState::AwaitingLoginResult && !self.login_sent
    }

    /// The transport is connected; wait for the greeting.
    pub fn connected(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.transition(ConnectionState::AwaitingHello);
        }
    }

    /// Queue the login request. Single-shot per session.
    pub fn send_login(&mut self, credentials: Credentials) -> Result<()> {
        self.check_handshake()?;
        let login = UserLogin::new(self.language, credentials);
        self.queue(METHOD_USER_LOGIN, to_parameters(&login)?)?;
        self.login_sent = true;
        Ok(())
    }

    /// Queue a registration request. Registering logs the user in, so this
    /// counts as the session's login attempt.
    pub fn send_registration(&mut self, registration: UserRegistration) -> Result<()> {
        self.check_handshake()?;
        let registration = UserRegistration {
            language: self.language,
            ..registration
        };
        self.queue(METHOD_USER_REGISTER, to_parameters(&registration)?)?;
        self.login_sent = true;
        Ok(())
    }

    /// Queue a request that needs an authenticated session.
    pub fn send_request(&mut self, method: &'static str, parameters: Value) -> Result<()> {
        match self.state {
            ConnectionState::Closed => Err(ProtocolError::Closed.into()),
            ConnectionState::Authenticated => self.queue(method, parameters),
            _ => Err(ProtocolError::NotReady.into()),
        }
    }

    fn check_handshake(&self) -> std::result::Result<(), ProtocolError> {
        if self.state == ConnectionState::Closed {
            return Err(ProtocolError::Closed);
        }
        if self.login_sent {
            return Err(ProtocolError::AlreadyAttempted);
        }
        if self.state != ConnectionState::AwaitingLoginResult {
            return Err(ProtocolError::NotReady);
        }
        Ok(())
    }

    fn queue(&mut self, method: &'static str, parameters: Value) -> Result<()> {
        let payload = serialize_request(method, parameters)?;
        self.send_buf.push_back(Transmit::new(method, payload));
        Ok(())
    }

    /// Turn one inbound frame into an event, advancing the handshake.
    ///
    /// Frames that cannot be decoded become `Error` events and leave the
    /// state alone.
    pub fn handle_frame(&mut self, frame: RawFrame) -> Event {
        let event = match frame {
            RawFrame::Message(message) => decode_frame(&message),
            RawFrame::Invalid(error) => Err(format!("Invalid frame: {}", error)),
        };

        let event = match event {
            Ok(event) => event,
            Err(diagnostic) => {
                warn!(state = ?self.state, %diagnostic, "Undecodable frame");
                return Event::diagnostic(diagnostic);
            }
        };

        match (self.state, event.kind()) {
            (ConnectionState::Connecting, EventKind::Hello)
            | (ConnectionState::AwaitingHello, EventKind::Hello) => {
                self.transition(ConnectionState::AwaitingLoginResult);
            }
            (ConnectionState::AwaitingLoginResult, EventKind::LoggedIn) if self.login_sent => {
                self.transition(ConnectionState::Authenticated);
            }
            (ConnectionState::AwaitingLoginResult, EventKind::Error) if self.login_sent => {
                self.transition(ConnectionState::Failed);
            }
            (ConnectionState::Authenticated, EventKind::Hello)
            | (ConnectionState::Authenticated, EventKind::LoggedIn) => {
                debug!(state = ?self.state, kind = ?event.kind(), "Repeated handshake event");
            }
            (ConnectionState::Authenticated, _) => {}
            (state, kind) => {
                debug!(?state, ?kind, "Event outside its handshake step");
            }
        }

        event
    }

    /// The transport is gone. Returns the diagnostic to queue for the
    /// embedder, or `None` if the session already ended.
    pub fn fail(&mut self, error: &TransportError) -> Option<Event> {
        if self.state.is_terminal() {
            return None;
        }
        warn!(state = ?self.state, %error, "Session failed");
        self.transition(ConnectionState::Failed);
        self.send_buf.clear();
        Some(Event::diagnostic(error))
    }

    pub fn close(&mut self) {
        if self.state != ConnectionState::Closed {
            self.transition(ConnectionState::Closed);
        }
        self.send_buf.clear();
    }

    /// Get the next request to write, or `None` if the send buffer is empty.
    pub fn poll_transmit(&mut self) -> Option<Transmit> {
        self.send_buf.pop_front()
    }

    fn transition(&mut self, next: ConnectionState) {
        info!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}
