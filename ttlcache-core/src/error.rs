//! Error types for cache operations.

use thiserror::Error;

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` found a live entry under the key
    #[error("Item {key} already exists")]
    AlreadyExists { key: String },

    /// `replace` found no live entry under the key
    #[error("Item {key} doesn't exist")]
    NotFound { key: String },

    /// A value could not be written to a snapshot
    #[error("Cannot encode snapshot: {0}")]
    Encode(String),

    /// A snapshot could not be read back
    #[error("Malformed snapshot: {0}")]
    Decode(String),

    /// Opening, reading or writing a snapshot failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Returns `true` if this error came from `add` on a live key.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, CacheError::AlreadyExists { .. })
    }

    /// Returns `true` if this error came from `replace` on a missing key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }

    /// Maps a serde_json failure while reading a snapshot
    pub(crate) fn decoding(err: serde_json::Error) -> Self {
        if err.is_io() {
            CacheError::Io(err.into())
        } else {
            CacheError::Decode(err.to_string())
        }
    }

    /// Maps a serde_json failure while writing a snapshot
    pub(crate) fn encoding(err: serde_json::Error) -> Self {
        if err.is_io() {
            CacheError::Io(err.into())
        } else {
            CacheError::Encode(err.to_string())
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, CacheError>;
