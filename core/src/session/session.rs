//! RTT session over a transport.

use crate::{
    command::{ShellCommand, FRAME},
    log::LogWriter,
    transport::Transport,
    Error,
};
use std::time::Duration;

/// Writes which may accept nothing before a send gives up.
const WRITE_ATTEMPTS: u32 = 100;
const WRITE_BACKOFF: Duration = Duration::from_millis(1);

/// Session owns a transport and the channels used to talk to the shell.
#[derive(Debug)]
pub struct Session<T, O: LogWriter> {
    transport: T,
    logger: Option<O>,
    up_channel: usize,
    down_channel: usize,
}

impl<T: Transport, O: LogWriter> Session<T, O> {
    /// Creates a new session.
    pub fn new(
        transport: T,
        logger: Option<O>,
        up_channel: usize,
        down_channel: usize,
    ) -> Self {
        Self {
            transport,
            logger,
            up_channel,
            down_channel,
        }
    }

    /// Send raw bytes to the down channel.
    ///
    /// The down buffer may take a write in pieces. Fails with
    /// [Error::ShortWrite] once the target stops draining it.
    pub fn send<B: AsRef<[u8]>>(&mut self, buf: B) -> Result<(), Error> {
        let buf = buf.as_ref();
        let mut written = 0;
        let mut stalled = 0;
        while written < buf.len() {
            let rest = &buf[written..];
            let n = self
                .transport
                .write(self.down_channel, rest)?
                .min(rest.len());
            if n == 0 {
                stalled += 1;
                if stalled >= WRITE_ATTEMPTS {
                    return Err(Error::ShortWrite {
                        written,
                        len: buf.len(),
                    });
                }
                std::thread::sleep(WRITE_BACKOFF);
                continue;
            }
            if let Some(logger) = self.logger.as_mut() {
                logger.log_write(self.down_channel, &rest[..n]);
            }
            if n < rest.len() {
                tracing::debug!(
                    written = %n,
                    left = %(rest.len() - n),
                    "down buffer full",
                );
            }
            stalled = 0;
            written += n;
        }
        Ok(())
    }

    /// Send a framed command.
    pub fn send_command(
        &mut self,
        command: &ShellCommand,
    ) -> Result<(), Error> {
        self.send(command.encode())
    }

    /// Send text framed like a command, without deriving a response.
    pub fn send_line(&mut self, text: &str) -> Result<(), Error> {
        self.send(crate::command::encode(text))
    }

    /// Send text followed by a single frame, as used to wake the shell.
    pub fn send_raw_line(&mut self, text: &str) -> Result<(), Error> {
        self.send([text.as_bytes(), FRAME].concat())
    }

    /// Read what is available on the up channel into `buf`.
    pub fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let n = self.transport.read(self.up_channel, buf)?;
        if n > 0 {
            if let Some(logger) = self.logger.as_mut() {
                logger.log_read(self.up_channel, &buf[..n]);
            }
        }
        Ok(n)
    }

    /// Read and discard at most `max` pending bytes.
    ///
    /// Returns the number of bytes discarded.
    pub fn drain(&mut self, max: usize) -> Result<usize, Error> {
        let mut buf = vec![0; max];
        let n = self.read_available(&mut buf)?;
        if n > 0 {
            tracing::trace!(
                stale = ?String::from_utf8_lossy(&buf[..n]),
                "drained",
            );
        }
        Ok(n)
    }
}

impl<T, O: LogWriter> Session<T, O> {
    /// Channel read from.
    pub fn up_channel(&self) -> usize {
        self.up_channel
    }

    /// Channel written to.
    pub fn down_channel(&self) -> usize {
        self.down_channel
    }

    /// Get a reference to the transport.
    pub fn get_transport(&self) -> &T {
        &self.transport
    }

    /// Get a mut reference to the transport.
    pub fn get_transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
