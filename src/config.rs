//! Configuration for linekv
//!
//! Centralized configuration with sensible defaults. The backing file
//! location lives here and is handed to the engine at construction time;
//! nothing in the crate reads a process-wide path.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LineKvError, Result};

/// Main configuration for a linekv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing data file. Two sidecars live next to it:
    ///   {path}.lock   (mutation lock target)
    ///   {path}.tmp    (rewrite target, renamed over {path})
    pub path: PathBuf,

    /// fsync the rewritten file before it replaces the old one
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Addressing Configuration
    // -------------------------------------------------------------------------
    /// Modulus of the polynomial key hash. Bounds the highest home line.
    pub hash_modulus: u64,

    /// Number of consecutive lines probed for a key, starting at its home line
    pub probe_window: u64,

    // -------------------------------------------------------------------------
    // TTL Configuration
    // -------------------------------------------------------------------------
    /// Delay before re-attempting an expiry that found the lock busy
    pub ttl_retry_interval: Duration,

    /// Maximum re-attempts of a single expiry before giving up
    pub ttl_max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./linekv.db"),
            sync_writes: true,
            hash_modulus: crate::index::DEFAULT_MODULUS,
            probe_window: 8,
            ttl_retry_interval: Duration::from_millis(50),
            ttl_max_retries: 20,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LineKvError::Config("path must not be empty".to_string()));
        }
        if self.hash_modulus == 0 {
            return Err(LineKvError::Config(
                "hash_modulus must be at least 1".to_string(),
            ));
        }
        if self.probe_window == 0 {
            return Err(LineKvError::Config(
                "probe_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Enable or disable fsync of each rewritten file
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the hash modulus
    pub fn hash_modulus(mut self, modulus: u64) -> Self {
        self.config.hash_modulus = modulus;
        self
    }

    /// Set the probe window (1 disables probing)
    pub fn probe_window(mut self, window: u64) -> Self {
        self.config.probe_window = window;
        self
    }

    /// Set the retry delay for expiries that hit a busy lock
    pub fn ttl_retry_interval(mut self, interval: Duration) -> Self {
        self.config.ttl_retry_interval = interval;
        self
    }

    /// Set the retry budget for expiries that hit a busy lock
    pub fn ttl_max_retries(mut self, retries: u32) -> Self {
        self.config.ttl_max_retries = retries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
