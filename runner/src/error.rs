use std::path::PathBuf;
use thiserror::Error;

/// Error lexing a directive keyword.
#[derive(Debug, Error, PartialEq, Clone, Default)]
#[doc(hidden)]
pub enum LexError {
    /// Generic lex error.
    #[default]
    #[error("script parser lex")]
    Other,
}

/// Errors generated by the runner.
#[derive(Debug, Error)]
pub enum Error {
    /// Instruction is not supported.
    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),

    /// Directive argument is missing or invalid.
    #[error("invalid argument in '{0}'")]
    Argument(String),

    /// Include file could not be resolved.
    #[error("cannot include '{0}', file '{1}' does not exist")]
    Include(String, PathBuf),

    /// Output check without a preceding command.
    #[error("'{0}' must follow a command")]
    NoExchange(String),

    /// No attached probe has the serial number.
    #[error("no probe with serial number '{0}'")]
    ProbeNotFound(String),

    /// Error raised by the debug probe.
    #[error("probe failure: {0}")]
    Probe(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Input/output errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Shell session errors.
    #[error(transparent)]
    Shell(#[from] rtt_shell::Error),

    /// Regular expression errors.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Wrap an error raised by the debug probe.
    pub fn probe(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Probe(Box::new(err))
    }
}
