#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]

//! Drive the command shell of an embedded target over RTT.
//!
//! The target prints a prompt when idle and acknowledges commands
//! with a line such as `psk ok: abcdef`. Using the library you can:
//!
//! - Send commands over an RTT down channel
//! - Wait for the shell to return to its prompt
//! - Check the acknowledgment derived from the command
//!
//! ## Examples
//!
//! ### Configure a modem over the J-Link RTT telnet server.
//!
//! ```no_run
//! use rtt_shell::{transport::StreamTransport, RttShell, ShellOptions};
//!
//! let transport = StreamTransport::connect("127.0.0.1:19021").unwrap();
//! let mut shell = RttShell::new(transport, ShellOptions::default());
//!
//! shell.send_line("help").unwrap();
//! match shell.run_exchange("modem set psk abcdef").unwrap() {
//!     Some(exchange) if exchange.passed => println!("{}", exchange.response),
//!     Some(exchange) => eprintln!("rejected: {}", exchange.response),
//!     None => eprintln!("no prompt"),
//! }
//! ```
//!
//! ### An example of logging traffic.
//!
//! ```no_run
//! use rtt_shell::{log::PrefixLogWriter, transport::StreamTransport, RttShell};
//!
//! let transport = StreamTransport::connect("127.0.0.1:19021").unwrap();
//! let logger = PrefixLogWriter::new(std::io::stdout());
//! let options = Default::default();
//! let mut shell = RttShell::with_logger(transport, logger, options);
//! shell.run_exchange("modem get psk").unwrap();
//! ```

mod error;

pub mod command;
pub mod lines;
pub mod log;
pub mod prompt;
pub mod repl;
pub mod session;
pub mod sleep;
pub mod transport;

pub use command::{expected_response, ShellCommand};
pub use error::Error;
pub use lines::LineAssembler;
pub use prompt::PromptDetector;
pub use repl::{Exchange, RttShell, ShellOptions, Verdict};
pub use session::Session;
pub use sleep::{Sleep, ThreadSleep};
pub use transport::Transport;
