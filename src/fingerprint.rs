//! Content fingerprinting using BLAKE3
//!
//! A fingerprint is a digest over the exact byte content of a brain file.
//! Equality means "no observable change since last load"; any byte
//! difference, whitespace included, changes the digest.

use std::fmt;

/// Fixed-length content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of raw text content.
    ///
    /// Deterministic: identical content always produces an identical
    /// digest. No normalization is applied before hashing.
    pub fn of(content: &str) -> Self {
        Fingerprint(*blake3::hash(content.as_bytes()).as_bytes())
    }

    /// Lowercase hexadecimal rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
