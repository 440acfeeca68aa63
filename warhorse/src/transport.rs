//! Handle the network connection for a Warhorse session

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ConnectionError, TransportError};
use crate::sansio::{parse_message, ParseResult, RawFrame};
use crate::stream::Stream;

#[derive(Debug, PartialEq, Eq)]
enum Endpoint {
    Tcp(String),
    #[cfg(unix)]
    Unix(String),
}

/// Supported address forms:
///
/// - `tcp:host:port`
/// - `unix:/path/to/socket` (unix only)
/// - `http://host:port`, `ws://host:port` (treated as tcp, path ignored)
/// - `host:port`
fn parse_address(address: &str) -> Result<Endpoint, ConnectionError> {
    if let Some(addr) = address.strip_prefix("tcp:") {
        return Ok(Endpoint::Tcp(addr.into()));
    }
    if let Some(addr) = address.strip_prefix("unix:") {
        #[cfg(unix)]
        {
            let addr = addr.split(';').next().unwrap_or(addr);
            return Ok(Endpoint::Unix(addr.into()));
        }
        #[cfg(not(unix))]
        {
            let _ = addr;
            return Err(ConnectionError::Unreachable(format!(
                "{address}: unix sockets are not supported on this platform"
            )));
        }
    }

    let rest = ["http://", "https://", "ws://", "wss://"]
        .iter()
        .find_map(|scheme| address.strip_prefix(scheme))
        .map(|rest| rest.split('/').next().unwrap_or(rest))
        .unwrap_or(address);

    if rest.rfind(':').is_some() {
        Ok(Endpoint::Tcp(rest.into()))
    } else {
        Err(ConnectionError::Unreachable(format!(
            "{address}: invalid Warhorse address"
        )))
    }
}

fn connect_tcp(
    address: &str,
    addr: &str,
    timeout: Duration,
) -> Result<TcpStream, ConnectionError> {
    let addrs: Vec<SocketAddr> = addr
        .to_socket_addrs()
        .map_err(|e| ConnectionError::Unreachable(format!("{address}: {e}")))?
        .collect();

    let timeout = timeout.max(Duration::from_millis(1));
    let mut last_error = None;
    for sa in addrs {
        match TcpStream::connect_timeout(&sa, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true).ok();
                return Ok(stream);
            }
            Err(e) => {
                debug!(%sa, error = %e, "Connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => ConnectionError::from_io(address, &e),
        None => ConnectionError::Unreachable(format!("{address}: no addresses resolved")),
    })
}

/// The connection to one Warhorse endpoint.
///
/// Owns the socket, frames the inbound byte stream and writes requests.
/// The socket is released on `close()` and on drop.
pub struct Transport {
    stream: Option<Box<dyn Stream>>,
    address: String,
    recv_buf: Vec<u8>,
    max_frame_len: usize,
    /// Scratch buffer for socket reads
    scratch: Vec<u8>,
    /// Request bytes the socket has not accepted yet
    send_buf: Vec<u8>,
    max_send_backlog: usize,
    /// Failure seen while frames were still being handed out
    pending_error: Option<TransportError>,
}

impl Transport {
    pub fn connect(address: &str, config: &ClientConfig) -> Result<Self, ConnectionError> {
        let mut stream: Box<dyn Stream> = match parse_address(address)? {
            Endpoint::Tcp(addr) => Box::new(connect_tcp(address, &addr, config.connect_timeout)?),
            #[cfg(unix)]
            Endpoint::Unix(path) => Box::new(
                UnixStream::connect(&path).map_err(|e| ConnectionError::from_io(address, &e))?,
            ),
        };

        stream
            .set_nonblocking(true)
            .map_err(|e| ConnectionError::from_io(address, &e))?;

        info!(%address, "Connected to Warhorse");

        Ok(Self::from_stream(stream, address, config))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: Box<dyn Stream>, address: &str, config: &ClientConfig) -> Self {
        Transport {
            stream: Some(stream),
            address: address.into(),
            recv_buf: Vec::new(),
            max_frame_len: config.max_frame_len,
            scratch: vec![0u8; config.read_chunk.max(1)],
            send_buf: Vec::new(),
            max_send_backlog: config.max_send_backlog,
            pending_error: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Queue one complete request frame and write as much as the socket
    /// takes without blocking. The rest goes out on later
    /// [`flush`](Transport::flush) calls.
    ///
    /// Fails with `WriteFailed(WouldBlock)` once the peer has left more than
    /// `max_send_backlog` bytes unread.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.stream.is_none() {
            return Err(TransportError::NotConnected);
        }
        if self.send_buf.len() > self.max_send_backlog {
            return Err(TransportError::WriteFailed(io::ErrorKind::WouldBlock));
        }
        self.send_buf.extend_from_slice(bytes);
        self.flush()
    }

    /// Write buffered request bytes until the socket would block.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        let mut written = 0;
        let result = loop {
            if written == self.send_buf.len() {
                break stream.flush();
            }
            match stream.write(&self.send_buf[written..]) {
                Ok(0) => break Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => written += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.send_buf.drain(..written);

        if !self.send_buf.is_empty() {
            debug!(address = %self.address, pending = self.send_buf.len(), "Write backlog");
        }
        result.map_err(|e| TransportError::WriteFailed(e.kind()))
    }

    /// Number of request bytes not yet accepted by the socket.
    pub fn pending_output(&self) -> usize {
        self.send_buf.len()
    }

    /// Return up to `max_frames` complete frames without blocking.
    ///
    /// Partial frames stay buffered. Nothing is read from the socket once
    /// `max_frames` frames are available, so a caller that stops asking
    /// leaves the rest to TCP flow control.
    pub fn receive_available(&mut self, max_frames: usize) -> Result<Vec<RawFrame>, TransportError> {
        let mut frames = Vec::new();

        loop {
            while frames.len() < max_frames {
                match parse_message(&self.recv_buf) {
                    ParseResult::Complete { message, consumed } => {
                        self.recv_buf.drain(..consumed);
                        frames.push(RawFrame::Message(message));
                    }
                    ParseResult::Invalid { error, consumed } => {
                        self.recv_buf.drain(..consumed);
                        frames.push(RawFrame::Invalid(error));
                    }
                    ParseResult::Incomplete => break,
                }
            }

            if frames.len() >= max_frames {
                break;
            }

            let error = if let Some(e) = self.pending_error.take() {
                e
            } else if self.recv_buf.len() > self.max_frame_len {
                TransportError::Desync(self.max_frame_len)
            } else {
                let stream = match self.stream.as_mut() {
                    Some(stream) => stream,
                    None if frames.is_empty() => return Err(TransportError::NotConnected),
                    None => break,
                };

                match stream.read(&mut self.scratch) {
                    Ok(0) => TransportError::Disconnected("connection closed by server".into()),
                    Ok(n) => {
                        self.recv_buf.extend_from_slice(&self.scratch[..n]);
                        continue;
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => TransportError::from_read(&e),
                }
            };

            if frames.is_empty() {
                return Err(error);
            }
            self.pending_error = Some(error);
            break;
        }

        Ok(frames)
    }

    /// Release the connection. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown() {
                debug!(address = %self.address, error = %e, "Shutdown failed");
            }
            info!(address = %self.address, "Connection closed");
        }
        self.recv_buf.clear();
        self.send_buf.clear();
        self.pending_error = None;
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}
