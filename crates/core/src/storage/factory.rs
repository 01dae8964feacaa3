//! Resolves storage ids to initialized providers.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, info};

use docvault_shared::StorageSettings;
use docvault_shared::types::StorageId;

use super::error::StorageError;
use super::provider::StorageProvider;
use crate::document::{DocumentError, DocumentRepository, StorageTypeRepository};

/// Upper bound on cached providers.
const MAX_PROVIDERS: u64 = 256;

/// Builds, initializes and caches one provider per storage id.
pub struct StorageProviderFactory<R, S> {
    documents: Arc<R>,
    storage_types: Arc<S>,
    settings: StorageSettings,
    providers: Cache<StorageId, Arc<StorageProvider<R>>>,
}

impl<R, S> StorageProviderFactory<R, S>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository,
{
    /// Create a factory with an empty cache.
    #[must_use]
    pub fn new(documents: Arc<R>, storage_types: Arc<S>, settings: StorageSettings) -> Self {
        Self {
            documents,
            storage_types,
            settings,
            providers: Cache::new(MAX_PROVIDERS),
        }
    }

    /// Provider for `storage_id`, built and initialized on first use.
    ///
    /// Concurrent first calls for the same id share a single initialization.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStorageBackend` if no storage type has this id, or the
    /// provider's initialization error.
    pub async fn get_provider(
        &self,
        storage_id: StorageId,
    ) -> Result<Arc<StorageProvider<R>>, DocumentError> {
        self.providers
            .try_get_with(storage_id, self.build(storage_id))
            .await
            .map_err(unshare)
    }

    async fn build(&self, storage_id: StorageId) -> Result<Arc<StorageProvider<R>>, DocumentError> {
        let config = self
            .storage_types
            .find_by_id(storage_id)
            .await?
            .ok_or(DocumentError::UnknownStorageBackend(storage_id))?;

        debug!(
            storage_id = %storage_id,
            storage_type = %config.storage_type,
            "Creating storage provider"
        );
        let mut provider =
            StorageProvider::for_kind(config.storage_type, self.documents.clone(), &self.settings);
        provider.initialize(&config).await?;

        info!(
            storage_id = %storage_id,
            name = %config.name,
            storage_type = %config.storage_type,
            "Storage provider ready"
        );
        Ok(Arc::new(provider))
    }

    /// Drop the cached provider so the next lookup re-reads its configuration.
    pub async fn invalidate(&self, storage_id: StorageId) {
        self.providers.invalidate(&storage_id).await;
    }
}

/// Recover an owned error from one shared between concurrent initializers.
fn unshare(err: Arc<DocumentError>) -> DocumentError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match shared.as_ref() {
        DocumentError::NotFound(id) => DocumentError::NotFound(*id),
        DocumentError::ContentNotFound(id) => DocumentError::ContentNotFound(*id),
        DocumentError::UnknownStorageBackend(id) => DocumentError::UnknownStorageBackend(*id),
        DocumentError::Validation(msg) => DocumentError::Validation(msg.clone()),
        DocumentError::Repository(msg) => DocumentError::Repository(msg.clone()),
        DocumentError::Storage(inner) => DocumentError::Storage(match inner {
            StorageError::NotFound { key } => StorageError::not_found(key.clone()),
            StorageError::ConfigMismatch { expected, actual } => StorageError::ConfigMismatch {
                expected: *expected,
                actual: *actual,
            },
            StorageError::Configuration(msg) => StorageError::configuration(msg.clone()),
            StorageError::InvalidSequenceFolder(name) => {
                StorageError::InvalidSequenceFolder(name.clone())
            }
            StorageError::SequenceExhausted(dir) => StorageError::SequenceExhausted(dir.clone()),
            StorageError::Io(err) => StorageError::Io(std::io::Error::new(err.kind(), err.to_string())),
            StorageError::Operation(msg) => StorageError::operation(msg.clone()),
        }),
    })
}
