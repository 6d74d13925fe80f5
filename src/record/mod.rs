//! Record Module
//!
//! One stored key/value pair and its single-line text encoding.
//!
//! ## Line Format
//! ```text
//! ┌──────────────────┬───┬───────────────────────────────┐
//! │ JSON string key  │ ␠ │ JSON object value (compact)   │
//! └──────────────────┴───┴───────────────────────────────┘
//! ```
//! An empty line (after trimming) is an empty slot. Compact JSON never
//! contains a raw newline, so one record always occupies exactly one line.

mod codec;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use codec::{decode, decode_key, encode, DecodeError};
pub(crate) use codec::json_kind;

/// A stored record: the key is kept next to the value so every lookup can
/// verify it is reading its own slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub value: Map<String, Value>,
}

impl Record {
    pub fn new(key: impl Into<String>, value: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Value wrapped back into a `serde_json::Value`
    pub fn into_value(self) -> Value {
        Value::Object(self.value)
    }
}
