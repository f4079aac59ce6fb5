use thiserror::Error;

/// Error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    /// Command does not have the shape the shell acknowledges.
    #[error("malformed shell command {0:?}")]
    MalformedCommand(String),
    /// Channel is not exposed by the transport.
    #[error("unknown rtt channel {0}")]
    UnknownChannel(usize),
    /// Down buffer stopped accepting bytes.
    #[error("rtt down buffer took {written} of {len} bytes")]
    ShortWrite { written: usize, len: usize },
    /// Unhandled EOF error.
    #[error("unhandled EOF")]
    Eof,
    /// Error in IO operation.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Error raised by a transport backend.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a backend error as a transport failure.
    pub fn transport(
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport(Box::new(err))
    }
}
