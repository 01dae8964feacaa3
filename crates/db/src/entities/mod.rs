//! `SeaORM` entity definitions.

pub mod doc_storage_types;
pub mod documents;
