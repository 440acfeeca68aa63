use std::io;

/// Failure to establish a session, returned synchronously from `Client::open`.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Warhorse endpoint unreachable: '{0}'")]
    Unreachable(String),
    #[error("Connection refused by '{0}'")]
    Refused(String),
    #[error("Timed out connecting to '{0}'")]
    Timeout(String),
}

impl ConnectionError {
    /// Classify a connect failure for `address`.
    pub(crate) fn from_io(address: &str, e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionRefused => ConnectionError::Refused(address.into()),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                ConnectionError::Timeout(address.into())
            }
            _ => ConnectionError::Unreachable(format!("{address}: {e}")),
        }
    }
}

/// An operation was called in a session state that does not permit it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Warhorse: session is not ready for this request")]
    NotReady,
    #[error("Warhorse: login was already attempted on this session")]
    AlreadyAttempted,
    #[error("Warhorse: session is closed")]
    Closed,
}

/// Session-fatal I/O failure. Any of these moves the session to `Failed`.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport is not connected")]
    NotConnected,
    #[error("Write failed: {0:?}")]
    WriteFailed(io::ErrorKind),
    #[error("Connection lost: {0}")]
    Disconnected(String),
    #[error("Frame exceeds {0} bytes without terminator")]
    Desync(usize),
}

impl TransportError {
    pub(crate) fn from_read(e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::UnexpectedEof => TransportError::Disconnected(e.to_string()),
            kind => TransportError::Disconnected(format!("{kind:?}: {e}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("JSON Serialization Error")]
    Serialize(#[from] serde_json::Error),
    #[error("IO error")]
    Io(#[from] io::Error),
}

impl Error {
    /// The protocol error, if this is one.
    pub fn protocol(&self) -> Option<ProtocolError> {
        match self {
            Error::Protocol(e) => Some(*e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_classify() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(
            ConnectionError::from_io("tcp:127.0.0.1:1", &refused),
            ConnectionError::Refused("tcp:127.0.0.1:1".into())
        );

        let timeout = io::Error::from(io::ErrorKind::TimedOut);
        assert!(matches!(
            ConnectionError::from_io("x", &timeout),
            ConnectionError::Timeout(_)
        ));

        let other = io::Error::new(io::ErrorKind::NotFound, "no such host");
        assert!(matches!(
            ConnectionError::from_io("x", &other),
            ConnectionError::Unreachable(_)
        ));
    }

    #[test]
    fn test_protocol_accessor() {
        let e: Error = ProtocolError::Closed.into();
        assert_eq!(e.protocol(), Some(ProtocolError::Closed));

        let e: Error = TransportError::NotConnected.into();
        assert_eq!(e.protocol(), None);
    }
}
