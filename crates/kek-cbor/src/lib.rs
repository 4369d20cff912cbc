//! Canonical CBOR records and SHA-256 content hashes shared by the store, the
//! revision chain and the collection engine.
//!
//! Records are encoded by first lowering them to a `serde_cbor::Value`, whose
//! maps are ordered, so the same logical record always yields the same bytes
//! and therefore the same [`Hash`].

use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::value::Value as CborValue;
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix carried by every rendered hash (e.g. `sha256:deadbeef...`).
pub const HASH_PREFIX: &str = "sha256:";

/// Encode a record into deterministic CBOR bytes.
pub fn to_canonical_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_cbor::Error> {
    let canonical: CborValue = serde_cbor::value::to_value(value)?;
    serde_cbor::to_vec(&canonical)
}

/// Decode a record previously written with [`to_canonical_cbor`].
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_cbor::Error> {
    serde_cbor::from_slice(bytes)
}

/// 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Hash the canonical encoding of a record.
    pub fn of_cbor<T: Serialize>(value: &T) -> Result<Self, serde_cbor::Error> {
        Ok(Self::of_bytes(&to_canonical_cbor(value)?))
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&digest);
        Hash(arr)
    }

    /// Render as `sha256:<64 hex digits>`.
    pub fn to_hex(&self) -> String {
        format!("{HASH_PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
