//! Document metadata and content routes.

use std::io;

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::info;

use docvault_core::document::{
    CreateDocumentInput, Document, DocumentFilter, DocumentRepository, SortField,
    StorageTypeRepository, UpdateDocumentInput, mime::OCTET_STREAM,
};
use docvault_shared::types::{DocumentId, PageRequest, PageResponse};

use crate::{ApiError, AppState};

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Creates the document routes.
pub fn routes<R, S>(max_upload_bytes: usize) -> Router<AppState<R, S>>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    Router::new()
        .route(
            "/documents",
            get(list_documents::<R, S>).post(create_document::<R, S>),
        )
        .route(
            "/documents/{id}",
            get(get_document::<R, S>)
                .put(update_document::<R, S>)
                .delete(delete_document::<R, S>),
        )
        .route(
            "/documents/{id}/content",
            get(download_content::<R, S>)
                .post(upload_content::<R, S>)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing documents.
#[derive(Debug, Default, Deserialize)]
pub struct ListDocumentsQuery {
    /// Case-insensitive match on name or description.
    pub search_text: Option<String>,
    /// Sort column.
    pub sort_on: Option<SortField>,
    /// Ascending order (default true).
    pub sort_ascending: Option<bool>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListDocumentsQuery {
    fn into_parts(self) -> (DocumentFilter, PageRequest) {
        let defaults = PageRequest::default();
        let filter = DocumentFilter {
            search_text: self.search_text,
            sort_on: self.sort_on.unwrap_or_default(),
            sort_ascending: self.sort_ascending.unwrap_or(true),
        };
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        );
        (filter, page)
    }
}

/// Response for a content deletion.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Whether the document was removed.
    pub deleted: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `attachment; filename="..."; filename*=UTF-8''...`.
///
/// The quoted form is an ASCII fallback with unsafe characters replaced by
/// `_`; the extended form (RFC 5987) carries the exact UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        ext_value(file_name)
    )
}

/// Percent-encode everything outside the RFC 5987 `attr-char` set.
fn ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/documents`
async fn list_documents<R, S>(
    State(state): State<AppState<R, S>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<PageResponse<Document>>, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    let (filter, page) = query.into_parts();
    Ok(Json(state.documents.find(&filter, page).await?))
}

/// POST `/documents`
async fn create_document<R, S>(
    State(state): State<AppState<R, S>>,
    Json(payload): Json<CreateDocumentInput>,
) -> Result<impl IntoResponse, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    let document = state.documents.add(payload).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// GET `/documents/{id}`
async fn get_document<R, S>(
    State(state): State<AppState<R, S>>,
    Path(id): Path<DocumentId>,
) -> Result<Json<Document>, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    Ok(Json(state.documents.get_by_id(id).await?))
}

/// PUT `/documents/{id}`
async fn update_document<R, S>(
    State(state): State<AppState<R, S>>,
    Path(id): Path<DocumentId>,
    Json(payload): Json<UpdateDocumentInput>,
) -> Result<Json<Document>, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    Ok(Json(state.documents.update(id, payload).await?))
}

/// DELETE `/documents/{id}`
/// Removes the stored content and then the metadata record.
async fn delete_document<R, S>(
    State(state): State<AppState<R, S>>,
    Path(id): Path<DocumentId>,
) -> Result<Json<DeleteResponse>, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    let deleted = state.documents.delete_content(id).await?;
    info!(document_id = %id, deleted, "Delete requested");
    Ok(Json(DeleteResponse { deleted }))
}

/// POST `/documents/{id}/content`
/// Streams the `file` part of a multipart body into the document's backend.
async fn upload_content<R, S>(
    State(state): State<AppState<R, S>>,
    Path(id): Path<DocumentId>,
    mut multipart: Multipart,
) -> Result<Json<Document>, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::validation("file name is required"))?;

        let reader = Box::pin(StreamReader::new(field.map_err(io::Error::other)));
        let document = state.documents.set_content(id, &file_name, reader).await?;

        info!(document_id = %id, file_name = %file_name, "Content uploaded");
        return Ok(Json(document));
    }

    Err(ApiError::validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

/// GET `/documents/{id}/content`
async fn download_content<R, S>(
    State(state): State<AppState<R, S>>,
    Path(id): Path<DocumentId>,
) -> Result<Response, ApiError>
where
    R: DocumentRepository + 'static,
    S: StorageTypeRepository + 'static,
{
    let content = state.documents.get_content(id).await?;
    let content_type = content
        .mime_type
        .clone()
        .unwrap_or_else(|| OCTET_STREAM.to_string());
    let disposition = content_disposition(&content.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(content.reader)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf")]
    #[case(
        "my file.txt",
        "attachment; filename=\"my file.txt\"; filename*=UTF-8''my%20file.txt"
    )]
    #[case(
        "say \"hi\".txt",
        "attachment; filename=\"say _hi_.txt\"; filename*=UTF-8''say%20%22hi%22.txt"
    )]
    #[case(
        "日本.pdf",
        "attachment; filename=\"__.pdf\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC.pdf"
    )]
    #[case("a\r\nb", "attachment; filename=\"a__b\"; filename*=UTF-8''a%0D%0Ab")]
    #[case(
        "résumé (v2).pdf",
        "attachment; filename=\"r_sum_ (v2).pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9%20%28v2%29.pdf"
    )]
    fn test_content_disposition(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(content_disposition(name), expected);
    }

    #[test]
    fn test_list_query_defaults() {
        let (filter, page) = ListDocumentsQuery::default().into_parts();
        assert!(filter.sort_ascending);
        assert_eq!(filter.sort_on, SortField::CreatedAt);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 10);
    }

    #[test]
    fn test_list_query_clamps_page_size() {
        let query = ListDocumentsQuery {
            per_page: Some(10_000),
            page: Some(0),
            ..ListDocumentsQuery::default()
        };
        let (_, page) = query.into_parts();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, PageRequest::MAX_PER_PAGE);
    }
}
