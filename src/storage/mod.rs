//! Storage Module
//!
//! Persistent storage layer: one flat text file, one record per line.
//!
//! ## Responsibilities
//! - Read a single line slot without locking
//! - Serialize mutations through an exclusive, non-blocking file lock
//! - Rewrite the file so only the target line changes
//! - Probe a bounded window of lines to resolve hash collisions
//!
//! ## File Format
//! ```text
//! line 1     │ "A" {"n":1}                      (occupied slot)
//! line 2     │                                  (empty slot)
//! ...        │
//! line 33    │ "a" {"name":"Alice"}             (home slot of "a")
//! line 34    │ "BA" {"name":"Bob"}              (probed: "BA" also hashes to 33)
//! ```

mod file_store;
mod lock;

pub use file_store::FileStore;
pub use lock::FileLock;
