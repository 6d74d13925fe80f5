//! TTL Module
//!
//! Deferred, one-shot deletion of records created with a time-to-live.
//!
//! ## Responsibilities
//! - Run TTL waits off the caller's path (create returns immediately)
//! - Fire each expiry once through the same locked erase path as delete
//! - Treat "already absent" as success
//! - Tear down with the owning engine so no deletion outlives the store

mod scheduler;

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{LineKvError, Result};

pub use scheduler::TtlScheduler;

/// Identifies one scheduled expiry. Never reused within a scheduler.
pub type TimerId = u64;

/// Something that can delete a key when its TTL fires
pub trait ExpiryTarget: Send + Sync + 'static {
    /// Expire `key` on behalf of `timer`
    ///
    /// The target decides whether `timer` still owns the key; a timer that
    /// was superseded by a later delete or create should be a no-op.
    fn expire(&self, key: &str, timer: TimerId) -> Result<()>;
}

/// Instant at which a TTL started now runs out
///
/// Fails with `TtlOutOfRange` when the deadline is not representable.
pub fn deadline_after(ttl: Duration) -> Result<Instant> {
    Instant::now()
        .checked_add(ttl)
        .ok_or(LineKvError::TtlOutOfRange { ttl })
}

/// What happens to pending timers at shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Discard them
    Cancel,

    /// Wait for each to reach its deadline and fire
    Drain,
}

/// Retry policy for expiries that find the lock busy
#[derive(Debug, Clone)]
pub struct TtlConfig {
    pub retry_interval: Duration,
    pub max_retries: u32,
}

impl From<&Config> for TtlConfig {
    fn from(config: &Config) -> Self {
        Self {
            retry_interval: config.ttl_retry_interval,
            max_retries: config.ttl_max_retries,
        }
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        TtlConfig::from(&Config::default())
    }
}
