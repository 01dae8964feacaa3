//! Azure Blob Storage provider.
//!
//! Objects are keyed `{document_id}/{file_name}` inside one container per
//! storage type. Object I/O goes through an OpenDAL operator; the container
//! itself is created with [`ContainerClient`] during initialization.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use opendal::{Operator, services};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};

use docvault_shared::types::DocumentId;

use super::config::{BlobConnection, DocStorageType, StorageKind};
use super::container::ContainerClient;
use super::error::StorageError;
use super::provider::{CHUNK_SIZE, load_document, sanitize_file_name};
use crate::document::{
    Document, DocumentContent, DocumentError, DocumentRepository, mime::guess_mime,
};

/// Provider storing content as block blobs.
#[derive(Debug)]
pub struct BlobStorageProvider<R> {
    repo: Arc<R>,
    operator: Option<Operator>,
}

impl<R: DocumentRepository> BlobStorageProvider<R> {
    /// Create an uninitialized provider.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            operator: None,
        }
    }

    /// Create a provider over an existing operator, skipping container setup.
    #[must_use]
    pub fn with_operator(repo: Arc<R>, operator: Operator) -> Self {
        Self {
            repo,
            operator: Some(operator),
        }
    }

    /// Object key for a document's content.
    #[must_use]
    pub fn blob_key(document_id: DocumentId, file_name: &str) -> String {
        format!("{document_id}/{}", sanitize_file_name(file_name))
    }

    /// Resolve the connection, create the container if needed and build the
    /// object operator.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMismatch` for a non-blob configuration, a configuration
    /// error for missing or malformed connection parameters, and an operation
    /// error if the container cannot be created.
    pub async fn initialize(&mut self, config: &DocStorageType) -> Result<(), StorageError> {
        config.ensure_kind(StorageKind::AzureBlob)?;
        let connection = BlobConnection::from_config_params(&config.config_param)?;

        ContainerClient::new(connection.clone())
            .create_if_not_exists()
            .await?;

        let builder = services::Azblob::default()
            .endpoint(&connection.blob_endpoint)
            .account_name(&connection.account_name)
            .account_key(&connection.account_key)
            .container(&connection.container);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        self.operator = Some(operator);

        info!(
            storage_id = %config.id,
            container = %connection.container,
            account = %connection.account_name,
            "Initialized blob storage provider"
        );
        Ok(())
    }

    fn operator(&self) -> Result<&Operator, StorageError> {
        self.operator
            .as_ref()
            .ok_or_else(|| StorageError::configuration("blob storage provider is not initialized"))
    }

    /// Upload `source` as `{document_id}/{file_name}` and point the record at it.
    ///
    /// A previous blob under a different name is left in place.
    pub async fn set_content<S>(
        &self,
        document_id: DocumentId,
        file_name: &str,
        mut source: S,
    ) -> Result<Document, DocumentError>
    where
        S: AsyncRead + Unpin + Send,
    {
        let operator = self.operator()?;
        let mut document = load_document(self.repo.as_ref(), document_id).await?;
        let key = Self::blob_key(document_id, file_name);

        let mut writer = operator.writer(&key).await.map_err(StorageError::from)?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let uploaded: Result<u64, StorageError> = async {
            let mut total = 0u64;
            loop {
                let n = source.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
                total += n as u64;
            }
            writer.close().await?;
            Ok(total)
        }
        .await;

        let bytes = match uploaded {
            Ok(bytes) => bytes,
            Err(err) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(key = %key, error = %abort_err, "Failed to abort blob upload");
                }
                return Err(err.into());
            }
        };

        document.name = Some(file_name.to_string());
        document.mime_type = Some(guess_mime(file_name));
        document.physical_path = Some(key.clone());

        let updated = self.repo.update(document).await?;
        info!(document_id = %document_id, key = %key, bytes, "Uploaded document blob");
        Ok(updated.redacted())
    }

    /// Download the blob into memory and return a reader over it.
    pub async fn get_content(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentContent, DocumentError> {
        let operator = self.operator()?;
        let document = load_document(self.repo.as_ref(), document_id).await?;
        let key = document
            .physical_path()
            .ok_or(DocumentError::ContentNotFound(document_id))?;

        let buffer = match operator.read(key).await.map_err(StorageError::from) {
            Ok(buffer) => buffer,
            Err(err) if err.is_not_found() => {
                warn!(document_id = %document_id, key, "Document blob is missing");
                return Err(DocumentError::ContentNotFound(document_id));
            }
            Err(err) => return Err(err.into()),
        };

        Ok(DocumentContent {
            reader: Box::pin(Cursor::new(buffer.to_bytes())),
            file_name: document.display_name(),
            mime_type: document.mime_type.clone(),
        })
    }

    /// Delete the blob, then the metadata record.
    ///
    /// Blob deletion failures are logged and do not prevent the record from
    /// being removed.
    pub async fn delete_content(&self, document_id: DocumentId) -> Result<bool, DocumentError> {
        let operator = self.operator()?;
        let document = load_document(self.repo.as_ref(), document_id).await?;

        let Some(key) = document.physical_path() else {
            warn!(document_id = %document_id, "No blob key set for document");
            return Ok(false);
        };

        match operator.delete(key).await {
            Ok(()) => info!(document_id = %document_id, key, "Deleted document blob"),
            Err(err) => warn!(
                document_id = %document_id,
                key,
                error = %err,
                "Failed to delete document blob"
            ),
        }

        self.repo.delete(document_id).await
    }
}
