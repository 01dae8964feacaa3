//! Persistence traits for document metadata and storage backends.
//!
//! These traits are implemented by the db crate to provide actual database operations.

use std::future::Future;

use docvault_shared::types::{DocumentId, PageRequest, PageResponse, StorageId};

use super::error::DocumentError;
use super::types::{Document, DocumentFilter};
use crate::storage::DocStorageType;

/// Repository trait for document metadata.
///
/// Records returned here carry `physical_path`; callers outside the storage
/// layer must redact it.
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document record.
    fn create(
        &self,
        document: Document,
    ) -> impl Future<Output = Result<Document, DocumentError>> + Send;

    /// Find a document by ID.
    fn find_by_id(
        &self,
        id: DocumentId,
    ) -> impl Future<Output = Result<Option<Document>, DocumentError>> + Send;

    /// Persist every field of an existing record.
    ///
    /// Fails with `NotFound` if the record no longer exists.
    fn update(
        &self,
        document: Document,
    ) -> impl Future<Output = Result<Document, DocumentError>> + Send;

    /// Delete a document record. Returns whether a row was removed.
    fn delete(&self, id: DocumentId) -> impl Future<Output = Result<bool, DocumentError>> + Send;

    /// List documents page by page.
    fn find(
        &self,
        filter: &DocumentFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<PageResponse<Document>, DocumentError>> + Send;
}

/// Read access to configured storage backends.
pub trait StorageTypeRepository: Send + Sync {
    /// Find a storage backend configuration by ID.
    fn find_by_id(
        &self,
        id: StorageId,
    ) -> impl Future<Output = Result<Option<DocStorageType>, DocumentError>> + Send;
}
