//! API route definitions.

use axum::Router;

use docvault_core::document::{DocumentRepository, StorageTypeRepository};

use crate::AppState;

pub mod documents;
pub mod health;

/// Creates the API router with all routes.
pub fn api_routes<R, S>(max_upload_bytes: usize) -> Router<AppState<R, S>>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    Router::new()
        .merge(health::routes())
        .merge(documents::routes(max_upload_bytes))
}
