use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// A connected byte stream the transport can own.
pub trait Stream: Read + Write + Send + Sync {
    fn shutdown(&mut self) -> io::Result<()>;
    fn set_nonblocking(&mut self, b: bool) -> io::Result<()>;
}

impl Stream for TcpStream {
    #[inline]
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }

    #[inline]
    fn set_nonblocking(&mut self, b: bool) -> io::Result<()> {
        TcpStream::set_nonblocking(self, b)
    }
}

#[cfg(unix)]
impl Stream for UnixStream {
    #[inline]
    fn shutdown(&mut self) -> io::Result<()> {
        UnixStream::shutdown(self, Shutdown::Both)
    }

    #[inline]
    fn set_nonblocking(&mut self, b: bool) -> io::Result<()> {
        UnixStream::set_nonblocking(self, b)
    }
}
