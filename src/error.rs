//! Error types for entity services and their collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for service, store, mapper and cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the service layer.
///
/// The first three variants are the only kinds a service caller ever sees.
/// The remaining variants are produced by collaborators (store, mapper,
/// cache) and are folded into [`Error::Internal`] by
/// [`Error::at_service_boundary`].
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Identifier (or other lookup key) does not resolve to a stored entity.
    ///
    /// The message always contains the original lookup key.
    NotFound(String),

    /// Request rejected before touching the store.
    ///
    /// Raised when:
    /// - the sort field is absent or belongs to another entity type
    /// - a batch create receives an empty list
    /// - a page request has a zero size
    BadRequest(String),

    /// Any unexpected lower-layer failure, reported generically.
    ///
    /// Carries the original message for diagnostics.
    Internal(String),

    /// Store (database) failure.
    RepositoryError(String),

    /// Entity/representation conversion failure.
    MappingError(String),

    /// Serialization failed when converting a value to cache bytes.
    SerializationError(String),

    /// Deserialization failed when converting cache bytes to a value.
    ///
    /// **Recovery:** the cache entry is evicted and recomputed.
    DeserializationError(String),

    /// Invalid cache entry: corrupted envelope or bad magic.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and cached data.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Cache backend error.
    BackendError(String),

    /// Configuration could not be read or parsed.
    ConfigError(String),
}

impl Error {
    /// Status-like code for the error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::BadRequest(_) => 400,
            _ => 500,
        }
    }

    /// True for the two signals services raise themselves.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::BadRequest(_))
    }

    /// Translate a lower-layer failure into the service taxonomy.
    ///
    /// `NotFound`, `BadRequest` and `Internal` pass through unchanged;
    /// everything else becomes `Internal` carrying the original message.
    pub fn at_service_boundary(self) -> Error {
        match self {
            Error::NotFound(_) | Error::BadRequest(_) | Error::Internal(_) => self,
            other => {
                error!("Service operation failed: {}", other);
                Error::Internal(other.to_string())
            }
        }
    }

    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::BadRequest(msg)
            | Error::Internal(msg)
            | Error::RepositoryError(msg)
            | Error::MappingError(msg)
            | Error::SerializationError(msg)
            | Error::DeserializationError(msg)
            | Error::InvalidCacheEntry(msg)
            | Error::BackendError(msg)
            | Error::ConfigError(msg) => msg.clone(),
            Error::VersionMismatch { .. } => self.to_string(),
        }
    }

    /// Structured body for the outer transport layer.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_code(),
            message: self.message(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::MappingError(msg) => write!(f, "Mapping error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Error body handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl ErrorResponse {
    /// Render as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() || e.is_data() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Internal(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Internal(e.to_string())
    }
}
