//! Protocol Module
//!
//! Text commands accepted by the interactive shell, in the JSON-token form
//! the store has always been driven with:
//!
//! ```text
//! create "user1" {"name":"Alice"}        → ok
//! create "session" {"id":7} 0.5          → ok   (expires after 0.5s)
//! read "user1"                           → {"name":"Alice"}
//! delete "user1"                         → ok
//! read "user1"                           → error 006: Key "user1" does not exist
//! ```
//!
//! ### Status
//! - Ok: command succeeded, payload is the value for a read
//! - NotFound: key absent
//! - Error: any other failure, payload is the message

mod command;
mod parser;
mod response;

pub use command::{Command, CommandType};
pub use parser::{parse_command, ttl_from_secs};
pub use response::{Response, Status};
