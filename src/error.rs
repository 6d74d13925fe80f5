//! Error types for linekv
//!
//! Provides a unified error type for all operations. Every variant maps to a
//! stable numeric code (see [`LineKvError::code`]) so callers and the CLI can
//! report failures without matching on message text.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using LineKvError
pub type Result<T> = std::result::Result<T, LineKvError>;

/// Unified error type for linekv operations
#[derive(Debug, Error)]
pub enum LineKvError {
    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {len} characters exceeds the {max} character limit")]
    KeyTooLong { len: usize, max: usize },

    #[error("Invalid value: expected a JSON object, found {found}")]
    ValueNotObject { found: &'static str },

    #[error("Invalid value: {size} bytes exceeds the {max} byte limit")]
    ValueTooLarge { size: usize, max: usize },

    #[error("Invalid TTL: {:.3}s is too far in the future", .ttl.as_secs_f64())]
    TtlOutOfRange { ttl: std::time::Duration },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("File currently in use: lock {} is held by another writer", .path.display())]
    LockBusy { path: PathBuf },

    #[error("Duplicate key {key:?} already stored at line {line}")]
    DuplicateKey { key: String, line: u64 },

    #[error("Key {key:?} does not exist")]
    KeyNotFound { key: String },

    #[error("No free slot for key {key:?} in lines {home}..{}", .home + .window)]
    SlotsExhausted { key: String, home: u64, window: u64 },

    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: u64, reason: String },

    // -------------------------------------------------------------------------
    // I/O and Serialization Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration / Input Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl LineKvError {
    /// Stable numeric code for this error kind
    pub fn code(&self) -> u16 {
        match self {
            LineKvError::KeyTooLong { .. } => 1,
            LineKvError::ValueNotObject { .. } => 2,
            LineKvError::ValueTooLarge { .. } => 3,
            LineKvError::LockBusy { .. } => 4,
            // 5 and 7 were the delete-side "in use" and read-side "not
            // found" codes; both now report as 4 and 6.
            LineKvError::KeyNotFound { .. } => 6,
            LineKvError::DuplicateKey { .. } => 8,
            LineKvError::SlotsExhausted { .. } => 9,
            LineKvError::Corrupt { .. } => 10,
            LineKvError::Io(_) => 11,
            LineKvError::Serialization(_) => 12,
            LineKvError::Config(_) => 13,
            LineKvError::Parse(_) => 14,
            LineKvError::TtlOutOfRange { .. } => 15,
        }
    }

    /// Returns `true` if retrying the same call later may succeed.
    ///
    /// Only lock contention is transient; callers wanting resilience retry
    /// with backoff themselves.
    pub fn is_transient(&self) -> bool {
        matches!(self, LineKvError::LockBusy { .. })
    }

    /// Returns `true` for a `KeyNotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, LineKvError::KeyNotFound { .. })
    }

    pub(crate) fn key_not_found(key: &str) -> Self {
        LineKvError::KeyNotFound {
            key: key.to_string(),
        }
    }

    pub(crate) fn corrupt(line: u64, reason: impl Into<String>) -> Self {
        LineKvError::Corrupt {
            line,
            reason: reason.into(),
        }
    }
}
