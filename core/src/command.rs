//! Shell commands and the acknowledgment they must produce.
//!
//! Commands have the shape `<subject> <verb> [<key>] [<value>]`.
//! The shell acknowledges them as follows:
//!
//! | Command | Acknowledgment |
//! |---------|----------------|
//! | `modem set psk abcdef` | `psk ok: abcdef` |
//! | `modem get psk` | `psk ok` |
//! | `modem start` | `modem ok` |
use std::{fmt, str::FromStr};

use crate::Error;

/// Bytes framing a command for the shell's line editor.
pub const FRAME: &[u8] = b"\n\0";

/// A command for the remote shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    text: String,
    expected: String,
}

impl ShellCommand {
    /// Parse a command and derive its expected response.
    ///
    /// Fails with [Error::MalformedCommand] when the command has too
    /// few tokens for its verb.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let expected = expected_response(text)
            .ok_or_else(|| Error::MalformedCommand(text.to_owned()))?;
        Ok(Self {
            text: text.to_owned(),
            expected,
        })
    }

    /// Command text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Text the shell output must contain for the command to pass.
    pub fn expected_response(&self) -> &str {
        &self.expected
    }

    /// Bytes written to the shell.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.text)
    }
}

impl FromStr for ShellCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Derive the acknowledgment expected for a command.
///
/// Tokens are separated by single whitespace characters, so repeated
/// separators yield empty tokens. Commands whose verb is neither `set`
/// nor `get` are acknowledged with their subject.
///
/// Returns `None` when the command is too short for its verb.
pub fn expected_response(command: &str) -> Option<String> {
    let tokens: Vec<&str> = command.split(char::is_whitespace).collect();
    match tokens.get(1).copied()? {
        "set" => {
            let (key, value) = (tokens.get(2)?, tokens.get(3)?);
            Some([*key, "ok:", *value].join(" "))
        }
        "get" => Some([*tokens.get(2)?, "ok"].join(" ")),
        _ => Some([tokens[0], "ok"].join(" ")),
    }
}

/// Frame text as line editor input.
pub(crate) fn encode(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 2 * FRAME.len());
    bytes.extend_from_slice(FRAME);
    bytes.extend_from_slice(text.as_bytes());
    bytes.extend_from_slice(FRAME);
    bytes
}
