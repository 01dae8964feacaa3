//! Initial schema: storage backends and document metadata.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS documents CASCADE;
             DROP TABLE IF EXISTS doc_storage_types CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const DOCUMENTS_SQL: &str = r"
-- Configured storage backends, administered outside the application
CREATE TABLE doc_storage_types (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    storage_type VARCHAR(20) NOT NULL,
    config_param JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_storage_type CHECK (storage_type IN ('local_fs', 'azure_blob'))
);

-- Document metadata; content lives in the referenced backend
CREATE TABLE documents (
    id UUID PRIMARY KEY,
    name VARCHAR(255),
    description TEXT,
    mime_type VARCHAR(255),
    physical_path TEXT,
    author VARCHAR(255),
    doc_type VARCHAR(100),
    storage_id UUID NOT NULL REFERENCES doc_storage_types(id),
    created_at TIMESTAMPTZ DEFAULT now(),
    updated_at TIMESTAMPTZ DEFAULT now()
);

-- Index for listing by backend
CREATE INDEX idx_documents_storage ON documents(storage_id);

-- Indexes for sorted listings
CREATE INDEX idx_documents_created ON documents(created_at DESC);
CREATE INDEX idx_documents_name ON documents(lower(name));
";
