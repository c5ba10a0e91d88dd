//! Subscription session protocol
//!
//! One [`SessionHandler`] runs per accepted connection:
//!
//! ```text
//!   OPEN ──greeting──► READY ──line──► READY ... ──eof / decode error──► CLOSED
//! ```
//!
//! Wire format (UTF-8, newline-terminated):
//!
//! ```text
//!   S: OK RTP 0.0.1
//!   C: subscribe 5004            (no reply on success)
//!   S: error subscriber_limit_reached
//!   C: unsubscribe 5004          (never replied to)
//!   C: hello
//!   S: error unrecognized_command
//! ```

pub mod codec;
pub mod command;
pub mod handler;
pub mod state;

pub use codec::LineBuffer;
pub use command::{Reply, Request, PROTOCOL_VERSION, SUCCESS_SENTINEL};
pub use handler::SessionHandler;
pub use state::{SessionPhase, SessionState};
