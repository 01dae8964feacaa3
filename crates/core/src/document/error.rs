//! Document error types.

use thiserror::Error;

use docvault_shared::AppError;
use docvault_shared::types::{DocumentId, StorageId};

use crate::storage::StorageError;

/// Document operation errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No metadata record for the id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Metadata exists but the bytes are unset or missing.
    #[error("document content not found: {0}")]
    ContentNotFound(DocumentId),

    /// The storage id does not resolve to a configured backend.
    #[error("unknown storage backend: {0}")]
    UnknownStorageBackend(StorageId),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// Invalid input.
    #[error("validation error: {0}")]
    Validation(String),
}

impl DocumentError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        let message = err.to_string();
        match err {
            DocumentError::NotFound(_)
            | DocumentError::ContentNotFound(_)
            | DocumentError::UnknownStorageBackend(_) => Self::NotFound(message),
            DocumentError::Validation(_) => Self::Validation(message),
            DocumentError::Repository(_) => Self::Database(message),
            DocumentError::Storage(
                StorageError::Configuration(_) | StorageError::ConfigMismatch { .. },
            ) => Self::Internal(message),
            DocumentError::Storage(_) => Self::Storage(message),
        }
    }
}
