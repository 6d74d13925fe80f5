//! # linekv
//!
//! A minimal persistent key-value store with:
//! - JSON object values addressed by a hash of their key
//! - One flat text file, one record per line
//! - Fail-fast exclusive locking around every mutation
//! - Optional time-to-live expiry on a background timer
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 CLI / Shell / Library caller                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │        (validation, create / read / delete, TTL owner)       │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!   │  HashIndex  │     │  FileStore  │◄────│TtlScheduler │
//!   │ (key→line)  │     │(lock+rewrite│     │ (timer thr.)│
//!   └─────────────┘     └──────┬──────┘     └─────────────┘
//!                              │
//!                              ▼
//!                       ┌─────────────┐
//!                       │   Record    │
//!                       │ (line codec)│
//!                       └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod record;
pub mod storage;
pub mod ttl;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LineKvError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of linekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
