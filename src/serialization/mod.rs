//! Versioned binary encoding for cached representations.
//!
//! Every value written to a cache region is wrapped in an envelope:
//!
//! ```text
//! ┌─────────────────┬──────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ SCHEMA (varint)  │ POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴──────────────────┴──────────────────────────┘
//!   "TKHB"
//! ```
//!
//! A mismatched magic or schema version is reported as an error so the
//! caller can evict the entry and recompute it from the store.
//!
//! ```rust
//! use taskhub::serialization::{deserialize_from_cache, serialize_for_cache};
//!
//! # fn main() -> taskhub::Result<()> {
//! let titles = vec!["Alpha".to_string(), "Beta".to_string()];
//! let bytes = serialize_for_cache(&titles)?;
//! let back: Vec<String> = deserialize_from_cache(&bytes)?;
//! assert_eq!(titles, back);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Header identifying entries written by this crate.
pub const CACHE_MAGIC: [u8; 4] = *b"TKHB";

/// Version of the cached representation layout.
///
/// Bump when a DTO changes shape (field added, removed, reordered, retyped)
/// or an enum gains or loses a variant. Entries written under another
/// version are evicted on read.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Envelope around a cached payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode a value for a cache region.
///
/// # Errors
///
/// Returns `Error::SerializationError` if postcard cannot encode the value.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(&CacheEnvelope::new(value)).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode a value read from a cache region, checking magic and schema version.
///
/// # Errors
///
/// - `Error::DeserializationError`: payload cannot be decoded
/// - `Error::InvalidCacheEntry`: wrong magic header
/// - `Error::VersionMismatch`: written under another schema version
pub fn deserialize_from_cache<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        warn!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache schema mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

/// True when the error means the cached bytes are unusable and should be evicted.
pub fn is_stale_entry(err: &Error) -> bool {
    matches!(
        err,
        Error::DeserializationError(_) | Error::InvalidCacheEntry(_) | Error::VersionMismatch { .. }
    )
}
