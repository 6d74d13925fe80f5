//! Command definitions
//!
//! Represents one request from the shell or another caller.

use std::time::Duration;

use serde_json::Value;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Create,
    Read,
    Delete,
}

impl CommandType {
    /// Verb as typed in the shell
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Create => "create",
            CommandType::Read => "read",
            CommandType::Delete => "delete",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Store a new record, optionally expiring after `ttl`
    Create {
        key: String,
        value: Value,
        ttl: Option<Duration>,
    },

    /// Fetch a record's value
    Read { key: String },

    /// Remove a record
    Delete { key: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Create { .. } => CommandType::Create,
            Command::Read { .. } => CommandType::Read,
            Command::Delete { .. } => CommandType::Delete,
        }
    }

    /// Key the command addresses
    pub fn key(&self) -> &str {
        match self {
            Command::Create { key, .. } | Command::Read { key } | Command::Delete { key } => key,
        }
    }
}
