//! Engine Module
//!
//! The key-value engine that coordinates all components.
//!
//! ## Responsibilities
//! - Validate keys and values before anything touches the file
//! - Address records through the hash index
//! - Route mutations through the locked file store
//! - Own the TTL timer thread and tear it down on close

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

use crate::config::Config;
use crate::error::{LineKvError, Result};
use crate::index::HashIndex;
use crate::protocol::Command;
use crate::record::{self, Record};
use crate::storage::FileStore;
use crate::ttl::{deadline_after, ExpiryTarget, ShutdownMode, TimerId, TtlConfig, TtlScheduler};

/// Longest accepted key, in characters
pub const MAX_KEY_CHARS: usize = 32;

/// Largest accepted value, in bytes of compact JSON
pub const MAX_VALUE_BYTES: usize = 16 * 1024;

/// The main storage engine
///
/// ## Concurrency Model: fail-fast single writer
///
/// - **Mutations** (create/delete/expiry): each takes the engine's mutation
///   guard and then the exclusive file lock, both without waiting. Either
///   one being busy surfaces as `LockBusy`; there is no queue. The guard
///   keeps a mutation and its TTL bookkeeping in one step.
///
/// - **Reads**: take no lock. Every mutation swaps in a complete new file,
///   so a read sees the store either before or after any concurrent write.
///
/// The engine is `Send + Sync`; share it behind an `Arc`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Index + file store, shared with the TTL thread
    core: Arc<EngineCore>,

    /// Pending expiries
    ttl: TtlScheduler,
}

/// State the TTL thread needs to expire keys
struct EngineCore {
    index: HashIndex,
    store: FileStore,
    probe_window: u64,

    /// Timer that owns each key's expiry, if any. Held for the whole of a
    /// mutation so the store and this map always change together.
    expiring: Mutex<HashMap<String, TimerId>>,
}

impl EngineCore {
    fn home_line(&self, key: &str) -> u64 {
        self.index.home_line(key)
    }

    fn remove(&self, key: &str) -> Result<u64> {
        self.store.remove(self.home_line(key), self.probe_window, key)
    }

    /// Take the mutation guard without waiting
    fn begin_mutation(&self) -> Result<MutexGuard<'_, HashMap<String, TimerId>>> {
        self.expiring.try_lock().ok_or_else(|| LineKvError::LockBusy {
            path: self.store.lock_path().to_path_buf(),
        })
    }
}

impl ExpiryTarget for EngineCore {
    fn expire(&self, key: &str, timer: TimerId) -> Result<()> {
        let mut expiring = self.begin_mutation()?;

        if expiring.get(key) != Some(&timer) {
            tracing::debug!(key = %key, timer, "Superseded expiry skipped");
            return Ok(());
        }

        let result = self.remove(key).map(|_| ());
        if !matches!(&result, Err(e) if e.is_transient()) {
            expiring.remove(key);
        }
        result
    }
}

impl Engine {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Create the backing file (and parent directory) if missing
    /// 3. Start the TTL timer thread
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store = FileStore::open(&config.path, config.sync_writes)?;
        let core = Arc::new(EngineCore {
            index: HashIndex::new(config.hash_modulus),
            store,
            probe_window: config.probe_window,
            expiring: Mutex::new(HashMap::new()),
        });

        let ttl = TtlScheduler::start(
            Arc::clone(&core) as Arc<dyn ExpiryTarget>,
            TtlConfig::from(&config),
        )?;

        tracing::info!(
            path = %config.path.display(),
            modulus = config.hash_modulus,
            probe_window = config.probe_window,
            "Store opened"
        );

        Ok(Self { config, core, ttl })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified backing file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().path(path).build();
        Self::open(config)
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers. Only reads return a value.
    pub fn execute(&self, command: Command) -> Result<Option<Value>> {
        match command {
            Command::Create { key, value, ttl } => {
                self.create_value(&key, value, ttl)?;
                Ok(None)
            }
            Command::Read { key } => self.read(&key).map(Some),
            Command::Delete { key } => {
                self.delete(&key)?;
                Ok(None)
            }
        }
    }

    /// Create a record from JSON text
    ///
    /// Text that is not valid JSON is rejected as `ValueNotObject`.
    pub fn create(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;

        let value: Value =
            serde_json::from_str(value).map_err(|_| LineKvError::ValueNotObject {
                found: "invalid JSON",
            })?;

        self.create_value(key, value, ttl)
    }

    /// Create a record
    ///
    /// Steps:
    /// 1. Validate key length, value shape, value size and TTL range
    /// 2. Insert into the first free slot of the key's probe window
    /// 3. Schedule expiry if a TTL was given (never waits for it)
    pub fn create_value(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;

        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(LineKvError::ValueNotObject {
                    found: record::json_kind(&other),
                })
            }
        };

        let size = serde_json::to_string(&map)?.len();
        if size > MAX_VALUE_BYTES {
            return Err(LineKvError::ValueTooLarge {
                size,
                max: MAX_VALUE_BYTES,
            });
        }

        let deadline = ttl.map(deadline_after).transpose()?;

        let record = Record::new(key, map);
        let home = self.core.home_line(key);

        let mut expiring = self.core.begin_mutation()?;
        let line = self.core.store.insert(home, self.config.probe_window, &record)?;

        match deadline {
            Some(deadline) => {
                let timer = self.ttl.schedule_at(key, deadline);
                expiring.insert(key.to_string(), timer);
            }
            None => {
                expiring.remove(key);
            }
        }
        drop(expiring);

        tracing::debug!(
            key = %key,
            home,
            line,
            ttl_ms = ttl.map(|t| t.as_millis() as u64),
            "Created"
        );
        Ok(())
    }

    /// Read a record's value (always a JSON object)
    pub fn read(&self, key: &str) -> Result<Value> {
        let home = self.core.home_line(key);
        match self.core.store.lookup(home, self.config.probe_window, key)? {
            Some((_, record)) => Ok(record.into_value()),
            None => Err(LineKvError::key_not_found(key)),
        }
    }

    /// Read a record's value as compact JSON text
    pub fn read_json(&self, key: &str) -> Result<String> {
        Ok(self.read(key)?.to_string())
    }

    /// Delete a record
    ///
    /// A pending expiry for the key is cancelled so that a later re-create
    /// is not removed by the old timer.
    pub fn delete(&self, key: &str) -> Result<()> {
        let mut expiring = self.core.begin_mutation()?;
        let line = self.core.remove(key)?;
        if let Some(timer) = expiring.remove(key) {
            self.ttl.cancel(timer);
        }
        drop(expiring);

        tracing::debug!(key = %key, line, "Deleted");
        Ok(())
    }

    /// Close the engine, discarding pending expiries
    pub fn close(self) -> Result<()> {
        self.ttl.shutdown(ShutdownMode::Cancel);
        tracing::info!(path = %self.config.path.display(), "Store closed");
        Ok(())
    }

    /// Close the engine once every pending expiry has fired
    ///
    /// Blocks for up to the longest outstanding TTL.
    pub fn close_after_expiries(self) -> Result<()> {
        self.ttl.shutdown(ShutdownMode::Drain);
        tracing::info!(path = %self.config.path.display(), "Store closed after expiries");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Home line of `key`
    pub fn home_line(&self, key: &str) -> u64 {
        self.core.home_line(key)
    }

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Number of lines in the backing file
    pub fn line_count(&self) -> Result<u64> {
        self.core.store.line_count()
    }

    /// Expiries accepted by the timer thread and not yet fired
    pub fn pending_expiries(&self) -> usize {
        self.ttl.pending()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn validate_key(key: &str) -> Result<()> {
    let len = key.chars().count();
    if len > MAX_KEY_CHARS {
        return Err(LineKvError::KeyTooLong {
            len,
            max: MAX_KEY_CHARS,
        });
    }
    Ok(())
}
