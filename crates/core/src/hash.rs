//! Content hashes and asset keys.

use base64::Engine;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 content hash represented as 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute SHA-256 hash of data.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Encode as lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode as unpadded URL-safe base64, the form clients verify assets against.
    pub fn to_base64url(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Derive the manifest identifier for this hash.
    pub fn to_uuid(&self) -> String {
        // A 64-char hex digest always satisfies the length check.
        uuid_from_hash(&self.to_hex()).unwrap_or_default()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// An MD5 digest used as a cache key for an asset.
///
/// Not an integrity check: clients verify assets against the SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetKey([u8; 16]);

impl AssetKey {
    /// Compute the key for asset content.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Encode as lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetKey({})", self.to_hex())
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Format the first 32 characters of a hex digest as a UUID string.
///
/// This is a formatting transform only; the result carries no UUID version
/// or variant bits.
pub fn uuid_from_hash(hex: &str) -> crate::Result<String> {
    if hex.len() < 32 || !hex.is_ascii() {
        return Err(crate::Error::InvalidHash(format!(
            "expected at least 32 hex chars, got {}",
            hex.len()
        )));
    }
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}
