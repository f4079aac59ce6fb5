//! Byte transports carrying RTT channels between host and target.
//!
//! A [Transport] exposes numbered up (target to host) and down
//! (host to target) buffers. Reads never block: a read that finds
//! nothing returns `Ok(0)`.
//!
//! [StreamTransport] wraps a byte stream which carries a single
//! channel, for example the terminal server a debug probe exposes
//! over TCP.
//!
//! # Example
//!
//! ```no_run
//! use rtt_shell::{transport::StreamTransport, RttShell};
//!
//! let transport = StreamTransport::connect("127.0.0.1:19021").unwrap();
//! let mut shell = RttShell::new(transport, Default::default());
//! let exchange = shell.run_exchange("modem get psk").unwrap();
//! ```

use std::{
    io::{self, Read, Write},
    net::{TcpStream, ToSocketAddrs},
};

use crate::Error;

/// Default port of the RTT terminal server.
pub const DEFAULT_PORT: u16 = 19021;

/// Non-blocking access to numbered RTT buffers.
pub trait Transport {
    /// Read whatever is available on an up channel into `buf`.
    ///
    /// Returns `Ok(0)` when nothing is pending.
    fn read(&mut self, channel: usize, buf: &mut [u8]) -> Result<usize, Error>;

    /// Write bytes to a down channel.
    ///
    /// Returns the number of bytes the target buffer accepted.
    fn write(&mut self, channel: usize, data: &[u8]) -> Result<usize, Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read(&mut self, channel: usize, buf: &mut [u8]) -> Result<usize, Error> {
        (**self).read(channel, buf)
    }

    fn write(&mut self, channel: usize, data: &[u8]) -> Result<usize, Error> {
        (**self).write(channel, data)
    }
}

/// Streams whose blocking mode can be toggled.
pub trait NonBlocking {
    /// Switch the stream to non-blocking mode.
    fn set_non_blocking(&mut self) -> io::Result<()>;
    /// Switch the stream back to blocking mode.
    fn set_blocking(&mut self) -> io::Result<()>;
}

impl NonBlocking for TcpStream {
    fn set_non_blocking(&mut self) -> io::Result<()> {
        self.set_nonblocking(true)
    }

    fn set_blocking(&mut self) -> io::Result<()> {
        self.set_nonblocking(false)
    }
}

/// Transport over a byte stream carrying one RTT channel.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    channel: usize,
}

impl StreamTransport<TcpStream> {
    /// Connect to an RTT terminal server.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        tracing::debug!(peer = ?stream.peer_addr().ok(), "rtt connected");
        Ok(Self::new(stream))
    }
}

impl<S> StreamTransport<S> {
    /// Wrap a stream which carries channel `0`.
    pub fn new(stream: S) -> Self {
        Self::with_channel(stream, 0)
    }

    /// Wrap a stream which carries the given channel.
    pub fn with_channel(stream: S, channel: usize) -> Self {
        Self { stream, channel }
    }

    /// Channel carried by the stream.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Get a reference to the original stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get the original stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn check_channel(&self, channel: usize) -> Result<(), Error> {
        if channel == self.channel {
            Ok(())
        } else {
            Err(Error::UnknownChannel(channel))
        }
    }
}

impl<S: Read + Write + NonBlocking> Transport for StreamTransport<S> {
    fn read(&mut self, channel: usize, buf: &mut [u8]) -> Result<usize, Error> {
        self.check_channel(channel)?;
        if buf.is_empty() {
            return Ok(0);
        }

        self.stream.set_non_blocking()?;
        let result = self.stream.read(buf);
        // Writes stay blocking.
        let restored = self.stream.set_blocking();

        let n = match result {
            Ok(0) => return Err(Error::Eof),
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => 0,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => 0,
            Err(err) => return Err(err.into()),
        };
        match restored {
            Ok(()) => Ok(n),
            // Bytes already taken off the stream are not dropped.
            Err(err) if n > 0 => {
                tracing::warn!(error = %err, "stream left non-blocking");
                Ok(n)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, channel: usize, data: &[u8]) -> Result<usize, Error> {
        self.check_channel(channel)?;
        self.stream.write_all(data)?;
        self.stream.flush()?;
        Ok(data.len())
    }
}
