//! Content storage backends.
//!
//! Each configured backend ([`DocStorageType`]) gets one [`StorageProvider`],
//! created and initialized on first use by the [`StorageProviderFactory`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   StorageProviderFactory                     │
//! │              (storage_id -> initialized provider)            │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │ LocalFsProvider              │ BlobStorageProvider           │
//! │ {base}/{y}/{m}/{d}/{h}/{seq} │ {container}/{doc_id}/{name}   │
//! │ tokio::fs, staged writes     │ OpenDAL Azblob operator       │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```

mod blob;
mod config;
mod container;
mod error;
mod factory;
mod local;
mod location;
mod provider;

pub use blob::BlobStorageProvider;
pub use config::{BlobConnection, DocStorageType, StorageKind};
pub use container::{API_VERSION, ContainerClient};
pub use error::StorageError;
pub use factory::StorageProviderFactory;
pub use local::LocalFsProvider;
pub use location::{LocationGenerator, sequence_name};
pub use provider::{CHUNK_SIZE, StorageProvider, sanitize_file_name};
