//! In-memory repositories shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use tokio::io::AsyncReadExt;

use docvault_shared::types::{DocumentId, PageRequest, PageResponse, StorageId};

use crate::document::{
    ContentReader, Document, DocumentError, DocumentFilter, DocumentRepository,
    StorageTypeRepository,
};
use crate::storage::DocStorageType;

/// Document repository backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentRepository {
    /// Store a record as-is, bypassing `create`.
    pub fn insert(&self, document: Document) -> Document {
        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        document
    }

    /// Raw stored record, including `physical_path`.
    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.documents.lock().unwrap().get(&id).cloned()
    }
}

impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, mut document: Document) -> Result<Document, DocumentError> {
        let now = Utc::now();
        document.created_at.get_or_insert(now);
        document.updated_at = Some(now);
        Ok(self.insert(document))
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, DocumentError> {
        Ok(self.get(id))
    }

    async fn update(&self, mut document: Document) -> Result<Document, DocumentError> {
        let mut documents = self.documents.lock().unwrap();
        if !documents.contains_key(&document.id) {
            return Err(DocumentError::NotFound(document.id));
        }
        document.updated_at = Some(Utc::now());
        documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, DocumentError> {
        Ok(self.documents.lock().unwrap().remove(&id).is_some())
    }

    async fn find(
        &self,
        filter: &DocumentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Document>, DocumentError> {
        let mut matching: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        matching.sort_by_key(|d| d.name.clone());

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .collect();
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

/// Storage type repository backed by a `HashMap`, counting lookups.
#[derive(Debug, Default)]
pub struct InMemoryStorageTypes {
    types: Mutex<HashMap<StorageId, DocStorageType>>,
    lookups: AtomicUsize,
}

impl InMemoryStorageTypes {
    /// Register a storage type.
    pub fn with(self, storage_type: DocStorageType) -> Self {
        self.types
            .lock()
            .unwrap()
            .insert(storage_type.id, storage_type);
        self
    }

    /// Number of `find_by_id` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl StorageTypeRepository for InMemoryStorageTypes {
    async fn find_by_id(&self, id: StorageId) -> Result<Option<DocStorageType>, DocumentError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.types.lock().unwrap().get(&id).cloned())
    }
}

/// Drain a content reader into memory.
pub async fn read_all(mut reader: ContentReader) -> Vec<u8> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await.unwrap();
    bytes
}
