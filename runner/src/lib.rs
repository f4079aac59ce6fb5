//! Parser and interpreter for RTT provisioning scripts.
//!
//! A script lists shell commands, one per line, with `#$` instructions
//! for raw writes, pauses and output checks. Running a script against
//! an [RttShell](rtt_shell::RttShell) produces a [Report].
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod interpreter;
mod parser;
mod report;

pub mod flash;
#[cfg(feature = "probe")]
pub mod probe;

pub use error::Error;
pub use interpreter::ScriptFile;
pub use parser::*;
pub use report::{Outcome, Report};
pub use rtt_shell as shell;

/// Result type for the runner.
pub type Result<T> = std::result::Result<T, Error>;

