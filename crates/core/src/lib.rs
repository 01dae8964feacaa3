//! Core logic for DocVault.
//!
//! This crate contains the document domain and the storage backends, with no
//! web or database dependencies.
//!
//! # Modules
//!
//! - `document` - Document model, repository traits and the document service
//! - `storage` - Location generation, storage providers and the provider factory

pub mod document;
pub mod storage;

#[cfg(test)]
mod test_support;
