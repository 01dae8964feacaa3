//! Document metadata and content management.
//!
//! This module provides:
//! - The document model and listing filters
//! - Repository traits implemented by the db crate
//! - MIME type resolution from file names
//! - [`DocumentService`], which routes content operations to the backend
//!   owning each document

mod error;
pub mod mime;
mod repository;
mod service;
mod types;

pub use error::DocumentError;
pub use repository::{DocumentRepository, StorageTypeRepository};
pub use service::DocumentService;
pub use types::{
    ContentReader, CreateDocumentInput, Document, DocumentContent, DocumentFilter, SortField,
    UpdateDocumentInput,
};
