//! Index Module
//!
//! Deterministic key → line addressing.
//!
//! ## Responsibilities
//! - Hash a key to a value in `[0, m)`
//! - Shift that value to the 1-based home line of the key
//!
//! The same key always yields the same home line for a given modulus, so
//! create, read and delete all agree on where a record lives without any
//! in-memory index.

mod hash;

pub use hash::HashIndex;

/// Base of the polynomial hash
pub const DEFAULT_BASE: u64 = 31;

/// Default modulus (a large prime, collision chance ≈ 1/m)
pub const DEFAULT_MODULUS: u64 = 1_000_000_009;
