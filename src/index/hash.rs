//! Polynomial rolling hash
//!
//! `hash(s) = sum(value(s[i]) * p^i) mod m` with `value(c) = c - 'A' + 1`.
//! Characters below `'A'` give zero or negative values; the sum is reduced
//! with Euclidean remainder so the result always lands in `[0, m)`.

use super::{DEFAULT_BASE, DEFAULT_MODULUS};

/// Maps keys to line numbers in the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashIndex {
    base: u64,
    modulus: u64,
}

impl HashIndex {
    /// Create an index with the given modulus (must be non-zero)
    pub fn new(modulus: u64) -> Self {
        Self {
            base: DEFAULT_BASE,
            modulus: modulus.max(1),
        }
    }

    /// Raw hash of `key`, in `[0, modulus)`
    pub fn locate(&self, key: &str) -> u64 {
        let m = self.modulus as i128;
        let p = self.base as i128;

        let mut hash: i128 = 0;
        let mut p_pow: i128 = 1;
        for c in key.chars() {
            let value = c as i128 - 'A' as i128 + 1;
            hash = (hash + value.rem_euclid(m) * p_pow).rem_euclid(m);
            p_pow = (p_pow * p) % m;
        }

        hash as u64
    }

    /// 1-based line that `key` hashes to
    ///
    /// The hash is the line number. Hash 0 has no line of its own and maps
    /// to line `modulus`, which no other hash can reach.
    pub fn home_line(&self, key: &str) -> u64 {
        match self.locate(key) {
            0 => self.modulus,
            hash => hash,
        }
    }

    /// The modulus this index reduces by
    pub fn modulus(&self) -> u64 {
        self.modulus
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MODULUS)
    }
}
