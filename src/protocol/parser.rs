//! Shell line parser
//!
//! ## Grammar
//! ```text
//! create <json-string key> <json value> [ttl seconds]
//! read   <json-string key>
//! delete <json-string key>
//! ```
//! Arguments are JSON tokens separated by whitespace, so keys may contain
//! spaces as long as they are quoted: `read "user 1"`.

use std::time::Duration;

use serde_json::{Deserializer, Value};

use crate::error::{LineKvError, Result};

use super::Command;

/// Parse one shell line into a command
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = match line.find(char::is_whitespace) {
        Some(at) => (&line[..at], &line[at..]),
        None => (line, ""),
    };

    let mut args = parse_args(rest)?.into_iter();

    let command = match verb.to_ascii_lowercase().as_str() {
        "create" => {
            let key = expect_key(args.next(), "create")?;
            let value = args
                .next()
                .ok_or_else(|| parse_error("create requires a value"))?;
            let ttl = args.next().map(parse_ttl).transpose()?;
            Command::Create { key, value, ttl }
        }
        "read" => Command::Read {
            key: expect_key(args.next(), "read")?,
        },
        "delete" => Command::Delete {
            key: expect_key(args.next(), "delete")?,
        },
        "" => return Err(parse_error("empty command")),
        other => return Err(parse_error(format!("unknown command {:?}", other))),
    };

    if args.next().is_some() {
        return Err(parse_error(format!(
            "too many arguments for {}",
            command.command_type().as_str()
        )));
    }

    Ok(command)
}

/// Convert seconds (fractional allowed) into a TTL
pub fn ttl_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        parse_error(format!(
            "invalid ttl {}: must be a finite, non-negative number of seconds",
            secs
        ))
    })
}

fn parse_args(text: &str) -> Result<Vec<Value>> {
    Deserializer::from_str(text)
        .into_iter::<Value>()
        .map(|value| value.map_err(|e| parse_error(format!("invalid JSON argument: {}", e))))
        .collect()
}

fn expect_key(arg: Option<Value>, verb: &str) -> Result<String> {
    match arg {
        Some(Value::String(key)) => Ok(key),
        Some(_) => Err(parse_error(format!("{} key must be a JSON string", verb))),
        None => Err(parse_error(format!("{} requires a key", verb))),
    }
}

fn parse_ttl(arg: Value) -> Result<Duration> {
    match arg.as_f64() {
        Some(secs) => ttl_from_secs(secs),
        None => Err(parse_error("ttl must be a number of seconds")),
    }
}

fn parse_error(message: impl Into<String>) -> LineKvError {
    LineKvError::Parse(message.into())
}
