//! Document repository for database operations.
//!
//! Implements document metadata CRUD and paged listing using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use docvault_core::document::{
    Document, DocumentError, DocumentFilter, DocumentRepository as DocumentRepoTrait, SortField,
};
use docvault_shared::types::{DocumentId, PageRequest, PageResponse, StorageId};

use crate::entities::documents;

/// Document repository implementation.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
}

impl DocumentRepository {
    /// Create a new document repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl DocumentRepoTrait for DocumentRepository {
    async fn create(&self, mut document: Document) -> Result<Document, DocumentError> {
        let now = Utc::now();
        document.created_at.get_or_insert(now);
        document.updated_at = Some(now);

        let model = to_active_model(document)
            .insert(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, DocumentError> {
        let model = documents::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn update(&self, document: Document) -> Result<Document, DocumentError> {
        let id = document.id;
        let mut active_model = to_active_model(document);
        active_model.updated_at = Set(Some(Utc::now().into()));

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => DocumentError::NotFound(id),
            other => DocumentError::repository(other.to_string()),
        })?;

        Ok(to_domain(model))
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, DocumentError> {
        let result = documents::Entity::delete_many()
            .filter(documents::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn find(
        &self,
        filter: &DocumentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Document>, DocumentError> {
        let mut query = documents::Entity::find();
        if let Some(search) = filter.search() {
            let pattern = like_pattern(search);
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(documents::Column::Name)))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(documents::Column::Description)))
                            .like(pattern),
                    ),
            );
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?;

        let order = if filter.sort_ascending {
            Order::Asc
        } else {
            Order::Desc
        };

        let models = query
            .order_by(sort_column(filter.sort_on), order.clone())
            .order_by(documents::Column::Id, order)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?;

        Ok(PageResponse::new(
            models.into_iter().map(to_domain).collect(),
            page.page,
            page.per_page,
            total,
        ))
    }
}

/// Column backing a sort field.
fn sort_column(field: SortField) -> documents::Column {
    match field {
        SortField::Name => documents::Column::Name,
        SortField::CreatedAt => documents::Column::CreatedAt,
        SortField::UpdatedAt => documents::Column::UpdatedAt,
    }
}

/// Convert domain document to an active model with every column set.
fn to_active_model(document: Document) -> documents::ActiveModel {
    documents::ActiveModel {
        id: Set(document.id.into_inner()),
        name: Set(document.name),
        description: Set(document.description),
        mime_type: Set(document.mime_type),
        physical_path: Set(document.physical_path),
        author: Set(document.author),
        doc_type: Set(document.doc_type),
        storage_id: Set(document.storage_id.into_inner()),
        created_at: Set(document.created_at.map(Into::into)),
        updated_at: Set(document.updated_at.map(Into::into)),
    }
}

/// Convert database model to domain model.
fn to_domain(model: documents::Model) -> Document {
    Document {
        id: DocumentId::from_uuid(model.id),
        name: model.name,
        description: model.description,
        mime_type: model.mime_type,
        physical_path: model.physical_path,
        author: model.author,
        doc_type: model.doc_type,
        storage_id: StorageId::from_uuid(model.storage_id),
        created_at: model.created_at.map(|t| t.with_timezone(&Utc)),
        updated_at: model.updated_at.map(|t| t.with_timezone(&Utc)),
    }
}

// ============================================================================
// Pure functions for unit testing
// ============================================================================

/// Lowercased `LIKE` pattern matching `search` anywhere, with wildcards in
/// the search text escaped.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
