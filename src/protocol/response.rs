//! Response definitions
//!
//! Represents the outcome of a command as shown to a shell user.

use std::fmt;

use serde_json::Value;

use crate::error::{LineKvError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    Error,
}

/// A response to print
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Error code for `NotFound`/`Error`
    pub code: Option<u16>,

    /// Value for a read, error message otherwise
    pub payload: Option<String>,
}

impl Response {
    /// Create an OK response with optional value
    pub fn ok(value: Option<&Value>) -> Self {
        Self {
            status: Status::Ok,
            code: None,
            payload: value.map(Value::to_string),
        }
    }

    /// Create a response describing `error`
    pub fn error(error: &LineKvError) -> Self {
        let status = if error.is_not_found() {
            Status::NotFound
        } else {
            Status::Error
        };
        Self {
            status,
            code: Some(error.code()),
            payload: Some(error.to_string()),
        }
    }

    /// Build from an engine result
    pub fn from_result(result: Result<Option<Value>>) -> Self {
        match result {
            Ok(value) => Self::ok(value.as_ref()),
            Err(e) => Self::error(&e),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.payload) {
            (Status::Ok, Some(value)) => write!(f, "{}", value),
            (Status::Ok, None) => write!(f, "ok"),
            (_, payload) => write!(
                f,
                "error {:03}: {}",
                self.code.unwrap_or_default(),
                payload.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}
