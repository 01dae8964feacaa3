//! Document service implementation.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::info;

use docvault_shared::types::{DocumentId, PageRequest, PageResponse, StorageId};

use super::error::DocumentError;
use super::mime::guess_mime;
use super::repository::{DocumentRepository, StorageTypeRepository};
use super::types::{
    CreateDocumentInput, Document, DocumentContent, DocumentFilter, UpdateDocumentInput,
};
use crate::storage::StorageProviderFactory;

/// Document service: metadata CRUD plus content operations routed to the
/// backend that owns each document.
pub struct DocumentService<R, S> {
    repo: Arc<R>,
    providers: Arc<StorageProviderFactory<R, S>>,
    default_storage_id: Option<StorageId>,
}

impl<R, S> DocumentService<R, S>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository,
{
    /// Create a new document service.
    #[must_use]
    pub fn new(repo: Arc<R>, providers: Arc<StorageProviderFactory<R, S>>) -> Self {
        Self {
            repo,
            providers,
            default_storage_id: None,
        }
    }

    /// Storage backend for documents created without an explicit one.
    #[must_use]
    pub fn with_default_storage_id(mut self, storage_id: Option<StorageId>) -> Self {
        self.default_storage_id = storage_id;
        self
    }

    /// Create a metadata record.
    ///
    /// # Errors
    ///
    /// Returns a validation error if neither the input nor the service names
    /// a storage backend, or a repository error if persisting fails.
    pub async fn add(&self, input: CreateDocumentInput) -> Result<Document, DocumentError> {
        let storage_id = input
            .storage_id
            .or(self.default_storage_id)
            .ok_or_else(|| DocumentError::validation("storage_id is required"))?;

        let mut document = Document::new(storage_id);
        document.mime_type = input.name.as_deref().map(guess_mime);
        document.name = input.name;
        document.description = input.description;
        document.author = input.author;
        document.doc_type = input.doc_type;

        let created = self.repo.create(document).await?;
        info!(document_id = %created.id, storage_id = %storage_id, "Created document");
        Ok(created.redacted())
    }

    /// Get a document by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists.
    pub async fn get_by_id(&self, id: DocumentId) -> Result<Document, DocumentError> {
        self.repo
            .find_by_id(id)
            .await?
            .map(Document::redacted)
            .ok_or(DocumentError::NotFound(id))
    }

    /// List documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn find(
        &self,
        filter: &DocumentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Document>, DocumentError> {
        Ok(self.repo.find(filter, page).await?.map(Document::redacted))
    }

    /// Update descriptive metadata. Content fields are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists, or a validation error when
    /// moving a document that already has content to another backend.
    pub async fn update(
        &self,
        id: DocumentId,
        input: UpdateDocumentInput,
    ) -> Result<Document, DocumentError> {
        let mut document = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(DocumentError::NotFound(id))?;

        if let Some(storage_id) = input.storage_id
            && storage_id != document.storage_id
        {
            if document.has_content() {
                return Err(DocumentError::validation(
                    "storage_id cannot change once content is stored",
                ));
            }
            document.storage_id = storage_id;
        }
        if input.description.is_some() {
            document.description = input.description;
        }
        if input.author.is_some() {
            document.author = input.author;
        }
        if input.doc_type.is_some() {
            document.doc_type = input.doc_type;
        }

        Ok(self.repo.update(document).await?.redacted())
    }

    /// Store `source` as the document's content on its backend.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty file name, `NotFound` for an
    /// unknown document, `UnknownStorageBackend` if its backend is not
    /// configured, or the backend's storage error.
    pub async fn set_content<Src>(
        &self,
        id: DocumentId,
        file_name: &str,
        source: Src,
    ) -> Result<Document, DocumentError>
    where
        Src: AsyncRead + Unpin + Send,
    {
        if file_name.trim().is_empty() {
            return Err(DocumentError::validation("file name must not be empty"));
        }
        let document = self.get_by_id(id).await?;
        let provider = self.providers.get_provider(document.storage_id).await?;
        provider.set_content(id, file_name, source).await
    }

    /// Open the document's content for reading.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown document and `ContentNotFound` when
    /// no bytes are stored.
    pub async fn get_content(&self, id: DocumentId) -> Result<DocumentContent, DocumentError> {
        let document = self.get_by_id(id).await?;
        let provider = self.providers.get_provider(document.storage_id).await?;
        provider.get_content(id).await
    }

    /// Delete the document's content and metadata.
    ///
    /// Returns `false` without deleting anything when the document has no
    /// content.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown document.
    pub async fn delete_content(&self, id: DocumentId) -> Result<bool, DocumentError> {
        let document = self.get_by_id(id).await?;
        let provider = self.providers.get_provider(document.storage_id).await?;
        provider.delete_content(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocStorageType, StorageKind};
    use crate::test_support::{InMemoryDocumentRepository, InMemoryStorageTypes, read_all};
    use docvault_shared::StorageSettings;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        repo: Arc<InMemoryDocumentRepository>,
        service: DocumentService<InMemoryDocumentRepository, InMemoryStorageTypes>,
        local: StorageId,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().expect("tempdir");
        let local = StorageId::new();
        let types = InMemoryStorageTypes::default().with(DocStorageType::new(
            local,
            "local",
            StorageKind::LocalFs,
        ));
        let repo = Arc::new(InMemoryDocumentRepository::default());
        let factory = StorageProviderFactory::new(
            repo.clone(),
            Arc::new(types),
            StorageSettings::new(tmp.path().join("store"), tmp.path().join("tmp")),
        );
        let service =
            DocumentService::new(repo.clone(), Arc::new(factory)).with_default_storage_id(Some(local));
        Fixture {
            _tmp: tmp,
            repo,
            service,
            local,
        }
    }

    fn named(name: &str) -> CreateDocumentInput {
        CreateDocumentInput {
            name: Some(name.to_string()),
            ..CreateDocumentInput::default()
        }
    }

    #[tokio::test]
    async fn test_add_sniffs_mime_and_defaults_storage() {
        let fx = fixture();

        let document = fx.service.add(named("report.pdf")).await.expect("add");

        assert_eq!(document.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(document.storage_id, fx.local);
        assert!(document.created_at.is_some());
        assert!(fx.repo.get(document.id).is_some());
    }

    #[tokio::test]
    async fn test_add_without_name_has_no_mime() {
        let fx = fixture();
        let document = fx
            .service
            .add(CreateDocumentInput::default())
            .await
            .expect("add");
        assert_eq!(document.mime_type, None);
    }

    #[tokio::test]
    async fn test_add_requires_storage_id() {
        let fx = fixture();
        let service = DocumentService::new(fx.repo.clone(), fx.service.providers.clone());

        let err = service.add(named("a.txt")).await.unwrap_err();
        assert!(matches!(err, DocumentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let fx = fixture();
        let id = DocumentId::new();
        let err = fx.service.get_by_id(id).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_content_round_trip_hides_physical_path() {
        let fx = fixture();
        let document = fx.service.add(CreateDocumentInput::default()).await.expect("add");

        let updated = fx
            .service
            .set_content(document.id, "a.txt", &b"hello"[..])
            .await
            .expect("set content");
        assert!(updated.physical_path.is_none());
        assert_eq!(updated.mime_type.as_deref(), Some("text/plain"));

        let fetched = fx.service.get_by_id(document.id).await.expect("get");
        assert!(fetched.physical_path.is_none());
        assert!(fx.repo.get(document.id).unwrap().has_content());

        let content = fx.service.get_content(document.id).await.expect("content");
        assert_eq!(content.file_name, "a.txt");
        assert_eq!(read_all(content.reader).await, b"hello");

        let page = fx
            .service
            .find(&DocumentFilter::default(), PageRequest::default())
            .await
            .expect("find");
        assert!(page.data.iter().all(|d| d.physical_path.is_none()));
    }

    #[tokio::test]
    async fn test_set_content_rejects_empty_file_name() {
        let fx = fixture();
        let document = fx.service.add(CreateDocumentInput::default()).await.expect("add");

        let err = fx
            .service
            .set_content(document.id, "  ", &b"x"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let fx = fixture();
        let orphan = StorageId::new();
        let document = fx
            .service
            .add(CreateDocumentInput {
                storage_id: Some(orphan),
                ..CreateDocumentInput::default()
            })
            .await
            .expect("add");

        let err = fx
            .service
            .set_content(document.id, "a.txt", &b"x"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnknownStorageBackend(id) if id == orphan));
    }

    #[tokio::test]
    async fn test_get_content_before_upload() {
        let fx = fixture();
        let document = fx.service.add(named("a.txt")).await.expect("add");

        let err = fx.service.get_content(document.id).await.unwrap_err();
        assert!(matches!(err, DocumentError::ContentNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_content() {
        let fx = fixture();
        let empty = fx.service.add(named("empty.txt")).await.expect("add");
        assert!(!fx.service.delete_content(empty.id).await.expect("delete"));
        assert!(fx.repo.get(empty.id).is_some());

        let full = fx.service.add(named("full.txt")).await.expect("add");
        fx.service
            .set_content(full.id, "full.txt", &b"x"[..])
            .await
            .expect("set content");
        assert!(fx.service.delete_content(full.id).await.expect("delete"));
        assert!(fx.repo.get(full.id).is_none());

        let err = fx.service.delete_content(full.id).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let fx = fixture();
        let document = fx.service.add(named("a.txt")).await.expect("add");

        let updated = fx
            .service
            .update(
                document.id,
                UpdateDocumentInput {
                    description: Some("quarterly".to_string()),
                    author: Some("ops".to_string()),
                    ..UpdateDocumentInput::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.description.as_deref(), Some("quarterly"));
        assert_eq!(updated.author.as_deref(), Some("ops"));
        assert_eq!(updated.name.as_deref(), Some("a.txt"));
    }

    #[tokio::test]
    async fn test_update_storage_id_after_content_is_rejected() {
        let fx = fixture();
        let document = fx.service.add(named("a.txt")).await.expect("add");
        let other = StorageId::new();

        let moved = fx
            .service
            .update(
                document.id,
                UpdateDocumentInput {
                    storage_id: Some(other),
                    ..UpdateDocumentInput::default()
                },
            )
            .await
            .expect("move before content");
        assert_eq!(moved.storage_id, other);

        let mut stored = fx.repo.get(document.id).unwrap();
        stored.physical_path = Some("somewhere".to_string());
        fx.repo.insert(stored);

        let err = fx
            .service
            .update(
                document.id,
                UpdateDocumentInput {
                    storage_id: Some(fx.local),
                    ..UpdateDocumentInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Validation(_)));
    }
}
