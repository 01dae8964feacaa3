//! Document types and data structures.

use std::fmt;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use docvault_shared::types::{DocumentId, StorageId};

/// Document metadata record.
///
/// `physical_path` locates the bytes inside the owning backend. It is never
/// serialized, and every value handed to callers outside the storage layer
/// has it cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: DocumentId,
    /// Display/file name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// MIME type derived from `name`.
    pub mime_type: Option<String>,
    /// Backend-specific locator (local path or blob key).
    #[serde(skip)]
    pub physical_path: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// Caller-defined document classification.
    pub doc_type: Option<String>,
    /// Backend that owns the bytes.
    pub storage_id: StorageId,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create an empty document owned by `storage_id`.
    #[must_use]
    pub fn new(storage_id: StorageId) -> Self {
        Self {
            id: DocumentId::new(),
            name: None,
            description: None,
            mime_type: None,
            physical_path: None,
            author: None,
            doc_type: None,
            storage_id,
            created_at: None,
            updated_at: None,
        }
    }

    /// Physical locator, treating an empty string as unset.
    #[must_use]
    pub fn physical_path(&self) -> Option<&str> {
        self.physical_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether content has been attached.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.physical_path().is_some()
    }

    /// Clear the physical locator before handing the record out.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.physical_path = None;
        self
    }

    /// Name reported alongside downloaded content.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Input for creating a document record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDocumentInput {
    /// Display/file name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// Caller-defined document classification.
    pub doc_type: Option<String>,
    /// Owning backend; falls back to the configured default.
    pub storage_id: Option<StorageId>,
}

/// Input for updating a document's descriptive metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocumentInput {
    /// New description.
    pub description: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New classification.
    pub doc_type: Option<String>,
    /// New owning backend; only allowed while no content exists.
    pub storage_id: Option<StorageId>,
}

/// Column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Display name.
    Name,
    /// Creation time.
    #[default]
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

/// Filter for document listings.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentFilter {
    /// Case-insensitive substring matched against name and description.
    #[serde(default)]
    pub search_text: Option<String>,
    /// Sort column.
    #[serde(default)]
    pub sort_on: SortField,
    /// Ascending order when true.
    #[serde(default = "default_sort_ascending")]
    pub sort_ascending: bool,
}

fn default_sort_ascending() -> bool {
    true
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self {
            search_text: None,
            sort_on: SortField::default(),
            sort_ascending: default_sort_ascending(),
        }
    }
}

impl DocumentFilter {
    /// Trimmed search text, `None` when blank.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether `document` matches the search text.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        let Some(needle) = self.search() else {
            return true;
        };
        let needle = needle.to_lowercase();
        [&document.name, &document.description]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Boxed reader over a document's bytes.
pub type ContentReader = Pin<Box<dyn AsyncRead + Send>>;

/// Readable content plus the name to present it under.
pub struct DocumentContent {
    /// Stream positioned at the first byte.
    pub reader: ContentReader,
    /// Display name of the document.
    pub file_name: String,
    /// MIME type recorded for the content.
    pub mime_type: Option<String>,
}

impl fmt::Debug for DocumentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentContent")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, description: Option<&str>) -> Document {
        Document {
            name: Some(name.to_string()),
            description: description.map(String::from),
            ..Document::new(StorageId::new())
        }
    }

    #[test]
    fn test_physical_path_is_never_serialized() {
        let mut document = named("a.txt", None);
        document.physical_path = Some("/srv/docs/2025/1/1/0/0001/x_a.txt".to_string());

        let json = serde_json::to_value(&document).expect("serialize");
        assert!(json.get("physical_path").is_none());
        assert_eq!(json["name"], "a.txt");
    }

    #[test]
    fn test_empty_physical_path_is_unset() {
        let mut document = named("a.txt", None);
        document.physical_path = Some(String::new());
        assert!(!document.has_content());
        assert_eq!(document.physical_path(), None);

        document.physical_path = Some("key".to_string());
        assert!(document.has_content());
        assert!(!document.redacted().has_content());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let document = Document::new(StorageId::new());
        assert_eq!(document.display_name(), document.id.to_string());
        assert_eq!(named("report.pdf", None).display_name(), "report.pdf");
    }

    #[test]
    fn test_filter_matches_name_and_description() {
        let filter = DocumentFilter {
            search_text: Some("  INVOICE ".to_string()),
            ..DocumentFilter::default()
        };
        assert!(filter.matches(&named("march-invoice.pdf", None)));
        assert!(filter.matches(&named("scan.png", Some("Invoice scan"))));
        assert!(!filter.matches(&named("contract.docx", Some("signed"))));
        assert!(DocumentFilter::default().matches(&named("anything", None)));
    }

    #[test]
    fn test_filter_defaults() {
        let filter: DocumentFilter = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(filter.sort_on, SortField::CreatedAt);
        assert!(filter.sort_ascending);
        assert_eq!(filter.search(), None);
    }
}
