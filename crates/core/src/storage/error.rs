//! Storage error types.

use thiserror::Error;

use super::config::StorageKind;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key or path that was not found.
        key: String,
    },

    /// Provider initialized with configuration for another backend.
    #[error("storage configuration mismatch: provider serves {expected}, config is {actual}")]
    ConfigMismatch {
        /// Kind served by the provider.
        expected: StorageKind,
        /// Kind named by the configuration.
        actual: StorageKind,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// A sequence folder name is not a zero-padded number.
    #[error("invalid sequence folder name: {0}")]
    InvalidSequenceFolder(String),

    /// Every four digit sequence folder under an hour directory is full.
    #[error("no sequence folders left under {0}")]
    SequenceExhausted(String),

    /// Filesystem fault.
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Backend operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Operation(err.to_string())
    }
}
