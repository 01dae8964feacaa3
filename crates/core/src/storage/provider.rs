//! The closed set of storage providers.
//!
//! Every backend implements the same four content operations; dispatch is an
//! exhaustive `match` on the variant so adding a backend forces every call
//! site to handle it.

use std::sync::Arc;

use tokio::io::AsyncRead;

use docvault_shared::StorageSettings;
use docvault_shared::types::DocumentId;

use super::blob::BlobStorageProvider;
use super::config::{DocStorageType, StorageKind};
use super::error::StorageError;
use super::local::LocalFsProvider;
use crate::document::{Document, DocumentContent, DocumentError, DocumentRepository};

/// Upload/download chunk size (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Storage provider for one configured backend.
#[derive(Debug)]
pub enum StorageProvider<R> {
    /// Local filesystem backend.
    LocalFs(LocalFsProvider<R>),
    /// Azure Blob Storage backend.
    AzureBlob(BlobStorageProvider<R>),
}

impl<R: DocumentRepository> StorageProvider<R> {
    /// Create an uninitialized provider for `kind`.
    #[must_use]
    pub fn for_kind(kind: StorageKind, repo: Arc<R>, settings: &StorageSettings) -> Self {
        match kind {
            StorageKind::LocalFs => Self::LocalFs(LocalFsProvider::new(repo, settings)),
            StorageKind::AzureBlob => Self::AzureBlob(BlobStorageProvider::new(repo)),
        }
    }

    /// Kind of backend this provider serves.
    #[must_use]
    pub fn storage_type(&self) -> StorageKind {
        match self {
            Self::LocalFs(_) => StorageKind::LocalFs,
            Self::AzureBlob(_) => StorageKind::AzureBlob,
        }
    }

    /// One-time setup against the backend configuration.
    pub async fn initialize(&mut self, config: &DocStorageType) -> Result<(), StorageError> {
        match self {
            Self::LocalFs(provider) => provider.initialize(config).await,
            Self::AzureBlob(provider) => provider.initialize(config).await,
        }
    }

    /// Write `source` as the content of `document_id`.
    pub async fn set_content<S>(
        &self,
        document_id: DocumentId,
        file_name: &str,
        source: S,
    ) -> Result<Document, DocumentError>
    where
        S: AsyncRead + Unpin + Send,
    {
        match self {
            Self::LocalFs(provider) => provider.set_content(document_id, file_name, source).await,
            Self::AzureBlob(provider) => {
                provider.set_content(document_id, file_name, source).await
            }
        }
    }

    /// Open the content of `document_id` for reading.
    pub async fn get_content(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentContent, DocumentError> {
        match self {
            Self::LocalFs(provider) => provider.get_content(document_id).await,
            Self::AzureBlob(provider) => provider.get_content(document_id).await,
        }
    }

    /// Remove the content and then the metadata record of `document_id`.
    pub async fn delete_content(&self, document_id: DocumentId) -> Result<bool, DocumentError> {
        match self {
            Self::LocalFs(provider) => provider.delete_content(document_id).await,
            Self::AzureBlob(provider) => provider.delete_content(document_id).await,
        }
    }
}

/// Load a document or fail with `NotFound`.
pub(crate) async fn load_document<R: DocumentRepository>(
    repo: &R,
    document_id: DocumentId,
) -> Result<Document, DocumentError> {
    repo.find_by_id(document_id)
        .await?
        .ok_or(DocumentError::NotFound(document_id))
}

/// Make a display name safe to embed in a path or object key.
///
/// Path separators and control characters become `_`; everything else,
/// including non-ASCII text, is kept.
#[must_use]
pub fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "_".repeat(sanitized.len().max(1)),
        _ => sanitized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryDocumentRepository;
    use docvault_shared::types::StorageId;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_file_name("my file (1).pdf"), "my file (1).pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("dir\\name.txt"), "dir_name.txt");
        assert_eq!(sanitize_file_name("日本語.pdf"), "日本語.pdf");
        assert_eq!(sanitize_file_name(".."), "__");
        assert_eq!(sanitize_file_name(""), "_");
    }

    #[test]
    fn test_for_kind_matches_storage_type() {
        let repo = Arc::new(InMemoryDocumentRepository::default());
        let settings = StorageSettings::default();
        for kind in [StorageKind::LocalFs, StorageKind::AzureBlob] {
            let provider = StorageProvider::for_kind(kind, repo.clone(), &settings);
            assert_eq!(provider.storage_type(), kind);
        }
    }

    #[tokio::test]
    async fn test_initialize_rejects_foreign_config() {
        let repo = Arc::new(InMemoryDocumentRepository::default());
        let mut provider =
            StorageProvider::for_kind(StorageKind::LocalFs, repo, &StorageSettings::default());
        let config = DocStorageType::new(StorageId::new(), "blob", StorageKind::AzureBlob);

        let err = provider.initialize(&config).await.unwrap_err();
        assert!(matches!(err, StorageError::ConfigMismatch { .. }));
    }

    #[tokio::test]
    async fn test_load_document_not_found() {
        let repo = InMemoryDocumentRepository::default();
        let id = DocumentId::new();
        let err = load_document(&repo, id).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(missing) if missing == id));
    }
}
