//! Storage backend seeder for DocVault development and testing.
//!
//! Registers a local filesystem backend and, when
//! `AZURE_STORAGE_CONNECTION_STRING` is set, an Azure Blob backend. Both use
//! fixed ids so `DOCVAULT__STORAGE__DEFAULT_STORAGE_ID` can point at them.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use uuid::Uuid;

use docvault_core::document::StorageTypeRepository as _;
use docvault_core::storage::{BlobConnection, DocStorageType, StorageKind};
use docvault_db::StorageTypeRepository;
use docvault_shared::types::StorageId;

/// Local filesystem backend id (consistent for all seeds)
const LOCAL_STORAGE_ID: Uuid = Uuid::from_u128(1);
/// Azure Blob backend id (consistent for all seeds)
const BLOB_STORAGE_ID: Uuid = Uuid::from_u128(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = docvault_db::connect(&database_url).await?;
    let repo = StorageTypeRepository::new(db);

    println!("Seeding local filesystem backend...");
    seed(
        &repo,
        DocStorageType::new(
            StorageId::from_uuid(LOCAL_STORAGE_ID),
            "Local filesystem",
            StorageKind::LocalFs,
        ),
    )
    .await?;

    match std::env::var("AZURE_STORAGE_CONNECTION_STRING") {
        Ok(connection_string) => {
            println!("Seeding Azure Blob backend...");
            let container = std::env::var("AZURE_STORAGE_CONTAINER")
                .unwrap_or_else(|_| BlobConnection::DEFAULT_CONTAINER.to_string());
            seed(
                &repo,
                DocStorageType::new(
                    StorageId::from_uuid(BLOB_STORAGE_ID),
                    "Azure Blob",
                    StorageKind::AzureBlob,
                )
                .with_param(BlobConnection::CONNECTION_STRING, connection_string)
                .with_param(BlobConnection::CONTAINER_NAME, container),
            )
            .await?;
        }
        Err(_) => println!("  AZURE_STORAGE_CONNECTION_STRING not set, skipping Azure Blob..."),
    }

    println!("Seeding complete!");
    Ok(())
}

/// Inserts `storage_type` unless a backend with the same id exists.
async fn seed(repo: &StorageTypeRepository, storage_type: DocStorageType) -> anyhow::Result<()> {
    if repo.find_by_id(storage_type.id).await?.is_some() {
        println!("  {} already exists, skipping...", storage_type.name);
        return Ok(());
    }

    let created = repo.create(storage_type).await?;
    println!("  Registered {} ({})", created.name, created.id);
    Ok(())
}
