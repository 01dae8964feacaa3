//! Repository abstractions for data access.
//!
//! Repositories implement the persistence traits of `docvault-core`,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod document;
pub mod storage_type;

pub use document::DocumentRepository;
pub use storage_type::StorageTypeRepository;
