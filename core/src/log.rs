//! Types for echoing RTT traffic to a writer.
use std::io::Write;

/// Trait for types that log reads and writes on the transport.
pub trait LogWriter {
    /// Log bytes read from an up channel.
    fn log_read(&mut self, channel: usize, data: &[u8]);
    /// Log bytes written to a down channel.
    fn log_write(&mut self, channel: usize, data: &[u8]);
}

impl<L: LogWriter + ?Sized> LogWriter for Box<L> {
    fn log_read(&mut self, channel: usize, data: &[u8]) {
        (**self).log_read(channel, data)
    }

    fn log_write(&mut self, channel: usize, data: &[u8]) {
        (**self).log_write(channel, data)
    }
}

/// Noop log writer does not log anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogWriter;

impl LogWriter for NoopLogWriter {
    fn log_read(&mut self, _channel: usize, _data: &[u8]) {}
    fn log_write(&mut self, _channel: usize, _data: &[u8]) {}
}

/// Prefix log writer prefixes reads and writes.
///
/// If the data can be converted to UTF-8 it is printed
/// as a string otherwise a debug representation of the
/// bytes are printed.
///
/// Be aware that values written to the shell, for example
/// a pre-shared key, are logged in plain text.
#[derive(Debug)]
pub struct PrefixLogWriter<W> {
    writer: W,
}

impl<W: Write> PrefixLogWriter<W> {
    /// Create a prefix log writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Get the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn log(&mut self, target: &str, channel: usize, data: &[u8]) {
        let _ = match std::str::from_utf8(data) {
            Ok(data) => {
                writeln!(self.writer, "{}[{}]: {:?}", target, channel, data)
            }
            Err(..) => writeln!(
                self.writer,
                "{}[{}]:(bytes): {:?}",
                target, channel, data
            ),
        };
    }
}

impl<W: Write> LogWriter for PrefixLogWriter<W> {
    fn log_read(&mut self, channel: usize, data: &[u8]) {
        if !data.is_empty() {
            self.log("read", channel, data);
        }
    }

    fn log_write(&mut self, channel: usize, data: &[u8]) {
        self.log("write", channel, data);
    }
}

/// Standard log writer passes traffic through unformatted.
#[derive(Debug)]
pub struct StandardLogWriter<W> {
    writer: W,
}

impl<W: Write> StandardLogWriter<W> {
    /// Create a standard log writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> LogWriter for StandardLogWriter<W> {
    fn log_read(&mut self, _channel: usize, data: &[u8]) {
        let _ = self.writer.write_all(data);
        let _ = self.writer.flush();
    }

    fn log_write(&mut self, _channel: usize, data: &[u8]) {
        let _ = self.writer.write_all(data);
        let _ = self.writer.flush();
    }
}
