//! Record line codec
//!
//! Encodes a record as `<json key> <json value>` and decodes it back. The key
//! token is located with a streaming JSON parser rather than by splitting on
//! whitespace, so keys containing spaces round-trip.

use serde_json::{Deserializer, Value};
use thiserror::Error;

use super::Record;

/// Why a non-empty line could not be decoded
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(String);

/// Encode a record as one line (no trailing newline)
pub fn encode(record: &Record) -> serde_json::Result<String> {
    let key = serde_json::to_string(&record.key)?;
    let value = serde_json::to_string(&record.value)?;

    let mut line = String::with_capacity(key.len() + value.len() + 1);
    line.push_str(&key);
    line.push(' ');
    line.push_str(&value);
    Ok(line)
}

/// Decode a line. `Ok(None)` means the slot is empty.
pub fn decode(line: &str) -> Result<Option<Record>, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (key, rest) = split_key(line)?;

    let value: Value = serde_json::from_str(rest)
        .map_err(|e| DecodeError(format!("invalid value token: {}", e)))?;

    match value {
        Value::Object(map) => Ok(Some(Record { key, value: map })),
        other => Err(DecodeError(format!(
            "value is a {}, not an object",
            json_kind(&other)
        ))),
    }
}

/// Decode only the key token of a line. `Ok(None)` means the slot is empty.
pub fn decode_key(line: &str) -> Result<Option<String>, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    split_key(line).map(|(key, _)| Some(key))
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Split a trimmed, non-empty line into the decoded key and the remaining
/// value text.
fn split_key(line: &str) -> Result<(String, &str), DecodeError> {
    let mut stream = Deserializer::from_str(line).into_iter::<String>();

    let key = match stream.next() {
        Some(Ok(key)) => key,
        Some(Err(e)) => return Err(DecodeError(format!("invalid key token: {}", e))),
        None => return Err(DecodeError("missing key token".to_string())),
    };

    let rest = &line[stream.byte_offset()..];
    if !rest.starts_with(char::is_whitespace) {
        return Err(DecodeError("missing separator after key".to_string()));
    }

    let rest = rest.trim_start();
    if rest.is_empty() {
        return Err(DecodeError("missing value token".to_string()));
    }

    Ok((key, rest))
}
