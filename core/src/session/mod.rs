//! This module contains the [Session] which moves bytes between
//! the host and the target shell.
//!
//! A session does not know about prompts or responses, see
//! [crate::RttShell] for the command engine built on top of it.
//!
//! # Example
//!
//! ```no_run
//! use rtt_shell::{
//!     log::NoopLogWriter, session::Session, transport::StreamTransport,
//! };
//!
//! let transport = StreamTransport::connect("127.0.0.1:19021").unwrap();
//! let mut session = Session::<_, NoopLogWriter>::new(transport, None, 0, 0);
//! session.send_line("help").unwrap();
//! ```

mod session;

use crate::log::NoopLogWriter;

pub use session::Session;

/// Session without traffic logging.
pub type DefaultSession<T> = Session<T, NoopLogWriter>;
