//! DocVault API Server
//!
//! Main entry point for the DocVault document service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docvault_api::{AppState, create_router};
use docvault_core::document::DocumentService;
use docvault_core::storage::StorageProviderFactory;
use docvault_db::{DatabaseConnection, DocumentRepository, StorageTypeRepository, connect_with};
use docvault_shared::types::StorageId;
use docvault_shared::{AppConfig, StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docvault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let service = build_service(db, config.storage.clone());
    info!(
        base_dir = %config.storage.base_dir.display(),
        file_limit = config.storage.file_limit,
        default_storage_id = ?config.storage.default_storage_id,
        "Document service configured"
    );

    let state = AppState::new(Arc::new(service), config.server.max_upload_bytes);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Composes repositories, the provider factory and the document service.
fn build_service(
    db: DatabaseConnection,
    settings: StorageSettings,
) -> DocumentService<DocumentRepository, StorageTypeRepository> {
    let documents = Arc::new(DocumentRepository::new(db.clone()));
    let storage_types = Arc::new(StorageTypeRepository::new(db));
    let default_storage_id = settings.default_storage_id.map(StorageId::from_uuid);

    let providers = StorageProviderFactory::new(Arc::clone(&documents), storage_types, settings);

    DocumentService::new(documents, Arc::new(providers)).with_default_storage_id(default_storage_id)
}
