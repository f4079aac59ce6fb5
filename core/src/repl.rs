//! Command/response engine for the RTT shell.
//!
//! An exchange drains stale input, sends one framed command and polls
//! the up channel until the shell is back at its prompt. The verdict
//! compares the whole output of the exchange against the
//! acknowledgment derived from the command.

use crate::{
    command::ShellCommand,
    lines::LineAssembler,
    log::{LogWriter, NoopLogWriter},
    prompt::{PromptDetector, DEFAULT_PROMPT},
    session::Session,
    sleep::{Sleep, ThreadSleep},
    transport::Transport,
    Error,
};
use std::{
    fmt,
    ops::{Deref, DerefMut},
    time::Duration,
};

/// Options for a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOptions {
    /// Prompt printed by the shell when idle.
    pub prompt: String,
    /// Channel the shell writes to.
    pub up_channel: usize,
    /// Channel the shell reads from.
    pub down_channel: usize,
    /// Maximum bytes read per poll.
    pub chunk_size: usize,
    /// Number of polls before an exchange times out.
    pub max_polls: u32,
    /// Pause between polls.
    pub poll_interval: Duration,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            up_channel: 0,
            down_channel: 0,
            chunk_size: 1024,
            max_polls: 1000,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl ShellOptions {
    /// Approximate time an exchange waits for the prompt.
    pub fn timeout(&self) -> Duration {
        self.poll_interval * self.max_polls
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Expected response found.
    Pass,
    /// Prompt returned without the expected response.
    Fail,
    /// Prompt did not return in time.
    Timeout,
}

impl Verdict {
    /// Verdict for a possibly unresolved exchange.
    pub fn of(exchange: Option<&Exchange>) -> Self {
        exchange.map(Exchange::verdict).unwrap_or(Verdict::Timeout)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Timeout => "timeout",
        })
    }
}

/// A completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Command sent.
    pub command: String,
    /// Acknowledgment looked for.
    pub expected: String,
    /// Last line before the prompt reappeared.
    pub response: String,
    /// Whether the acknowledgment was found.
    pub passed: bool,
    /// All output read during the exchange.
    pub output: String,
}

impl Exchange {
    /// Pass or fail.
    pub fn verdict(&self) -> Verdict {
        if self.passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Shell session on an RTT channel pair.
///
/// Only one exchange runs at a time; every exchange holds the
/// transport exclusively until the prompt returns or it times out.
#[derive(Debug)]
pub struct RttShell<T, O: LogWriter = NoopLogWriter, S = ThreadSleep> {
    session: Session<T, O>,
    detector: PromptDetector,
    options: ShellOptions,
    sleeper: S,
}

impl<T: Transport> RttShell<T> {
    /// Creates a shell session without traffic logging.
    pub fn new(transport: T, options: ShellOptions) -> Self {
        Self::from_session(
            Session::new(
                transport,
                None,
                options.up_channel,
                options.down_channel,
            ),
            options,
        )
    }
}

impl<T: Transport, O: LogWriter> RttShell<T, O> {
    /// Creates a shell session which logs traffic.
    pub fn with_logger(transport: T, logger: O, options: ShellOptions) -> Self {
        Self::from_session(
            Session::new(
                transport,
                Some(logger),
                options.up_channel,
                options.down_channel,
            ),
            options,
        )
    }

    /// Wraps an existing session.
    pub fn from_session(session: Session<T, O>, options: ShellOptions) -> Self {
        Self {
            session,
            detector: PromptDetector::new(options.prompt.clone()),
            options,
            sleeper: ThreadSleep,
        }
    }
}

impl<T, O: LogWriter, S> RttShell<T, O, S> {
    /// Replace the sleeper used between polls.
    pub fn with_sleeper<N: Sleep>(self, sleeper: N) -> RttShell<T, O, N> {
        RttShell {
            session: self.session,
            detector: self.detector,
            options: self.options,
            sleeper,
        }
    }

    /// Get the shell options.
    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// Get the prompt detector.
    pub fn detector(&self) -> &PromptDetector {
        &self.detector
    }

    /// Get the sleeper.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Get an inner session.
    pub fn into_session(self) -> Session<T, O> {
        self.session
    }
}

impl<T: Transport, O: LogWriter, S: Sleep> RttShell<T, O, S> {
    /// Run one command and wait for the shell to return to its prompt.
    ///
    /// Returns `Ok(None)` when the prompt does not come back within
    /// the poll budget. A missing acknowledgment is not an error, it
    /// is reported through [Exchange::passed].
    pub fn run_exchange(
        &mut self,
        command: &str,
    ) -> Result<Option<Exchange>, Error> {
        let command = ShellCommand::parse(command)?;
        self.execute(&command)
    }

    /// Run a parsed command, see [RttShell::run_exchange].
    pub fn execute(
        &mut self,
        command: &ShellCommand,
    ) -> Result<Option<Exchange>, Error> {
        tracing::info!(command = %command, "rtt command");
        self.session.drain(self.options.chunk_size)?;
        self.session.send_command(command)?;

        let expected = command.expected_response();
        tracing::debug!(expected = %expected, "desired response");

        let mut output = LineAssembler::new();
        let mut buf = vec![0; self.options.chunk_size];
        for _ in 0..self.options.max_polls {
            let n = self.session.read_available(&mut buf)?;
            tracing::trace!(read = %n, "poll");
            output.append(&buf[..n]);

            let lines = output.lines();
            if let Some(response) = self.detector.response_line(&lines) {
                tracing::debug!(output = %output.as_str(), "prompt found");
                let passed = output.as_str().contains(expected);
                if passed {
                    tracing::info!(response = %response, "rtt response pass");
                } else {
                    tracing::info!(response = %response, "rtt response fail");
                    tracing::error!(
                        output = %output.as_str(),
                        "shell error response",
                    );
                }
                return Ok(Some(Exchange {
                    command: command.as_str().to_owned(),
                    expected: expected.to_owned(),
                    response: response.to_owned(),
                    passed,
                    output: output.as_str().to_owned(),
                }));
            }

            self.sleeper.sleep(self.options.poll_interval);
        }

        self.sleeper.sleep(self.options.poll_interval);
        tracing::warn!(
            command = %command,
            timeout = ?self.options.timeout(),
            output = %output.as_str(),
            "prompt not found",
        );
        Ok(None)
    }

    /// Pause using the session sleeper.
    pub fn sleep(&mut self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    /// Discard pending output.
    pub fn drain(&mut self) -> Result<usize, Error> {
        self.session.drain(self.options.chunk_size)
    }
}

impl<T, O: LogWriter, S> Deref for RttShell<T, O, S> {
    type Target = Session<T, O>;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<T, O: LogWriter, S> DerefMut for RttShell<T, O, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}
