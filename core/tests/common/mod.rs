#![allow(dead_code)]

use rtt_shell::{Error, Sleep, Transport};
use std::{collections::VecDeque, io, time::Duration};

/// Transport which plays back canned device output.
///
/// Bytes queued with [ScriptedTransport::stale] are pending before
/// anything is written. Each completed write releases the next batch
/// queued with [ScriptedTransport::reply], one chunk per read.
/// `write_limit` caps the bytes taken per write like a small down
/// buffer.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pending: VecDeque<Vec<u8>>,
    replies: VecDeque<Vec<Vec<u8>>>,
    pub written: Vec<Vec<u8>>,
    pub reads: usize,
    pub largest_read: usize,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub write_limit: Option<usize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stale(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.pending.push_back(bytes.as_ref().to_vec());
        self
    }

    pub fn reply<I, B>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let batch: Vec<Vec<u8>> =
            chunks.into_iter().map(|c| c.as_ref().to_vec()).collect();
        self.replies.push_back(batch);
        self
    }

    pub fn write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    pub fn pending(&self) -> usize {
        self.pending.iter().map(Vec::len).sum()
    }
}

impl Transport for ScriptedTransport {
    fn read(
        &mut self,
        _channel: usize,
        buf: &mut [u8],
    ) -> Result<usize, Error> {
        self.reads += 1;
        self.largest_read = self.largest_read.max(buf.len());
        if self.fail_reads {
            return Err(link_lost());
        }
        let Some(mut chunk) = self.pending.pop_front() else {
            return Ok(0);
        };
        if chunk.len() > buf.len() {
            let rest = chunk.split_off(buf.len());
            self.pending.push_front(rest);
        }
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }

    fn write(&mut self, _channel: usize, data: &[u8]) -> Result<usize, Error> {
        if self.fail_writes {
            return Err(link_lost());
        }
        let n = self.write_limit.map_or(data.len(), |l| l.min(data.len()));
        if n == 0 {
            return Ok(0);
        }
        self.written.push(data[..n].to_vec());
        if n == data.len() {
            if let Some(batch) = self.replies.pop_front() {
                self.pending.extend(batch);
            }
        }
        Ok(n)
    }
}

fn link_lost() -> Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "link lost").into()
}

/// Sleeper which only records the requested pauses.
#[derive(Debug, Default)]
pub struct RecordingSleep {
    pub calls: Vec<Duration>,
}

impl Sleep for RecordingSleep {
    fn sleep(&mut self, duration: Duration) {
        self.calls.push(duration);
    }
}
