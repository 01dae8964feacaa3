//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for document metadata and content
//! - JSON error responses
//! - Application state wiring

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use docvault_core::document::{DocumentRepository, DocumentService, StorageTypeRepository};
use docvault_db::{
    DocumentRepository as PgDocumentRepository, StorageTypeRepository as PgStorageTypeRepository,
};

pub use error::ApiError;

/// Application state shared across handlers.
///
/// Defaults to the database-backed repositories; tests substitute their own.
pub struct AppState<R = PgDocumentRepository, S = PgStorageTypeRepository> {
    /// Document service.
    pub documents: Arc<DocumentService<R, S>>,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl<R, S> AppState<R, S> {
    /// Create application state.
    #[must_use]
    pub fn new(documents: Arc<DocumentService<R, S>>, max_upload_bytes: usize) -> Self {
        Self {
            documents,
            max_upload_bytes,
        }
    }
}

impl<R, S> Clone for AppState<R, S> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Creates the main application router.
pub fn create_router<R, S>(state: AppState<R, S>) -> Router
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    Router::new()
        .nest("/api/v1", routes::api_routes(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
