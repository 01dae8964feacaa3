//! Shared types, errors, and configuration for DocVault.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for documents and storage backends
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, StorageSettings};
pub use error::{AppError, AppResult};
