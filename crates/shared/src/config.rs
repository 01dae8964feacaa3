//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;
use uuid::Uuid;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Document storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Document storage configuration.
///
/// Built once at startup and handed to the local filesystem provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Root directory for locally stored document content.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Staging directory for in-flight uploads.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Maximum number of files per sequence folder.
    #[serde(default = "default_file_limit")]
    pub file_limit: usize,
    /// Storage backend assigned to documents created without one.
    #[serde(default)]
    pub default_storage_id: Option<Uuid>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            temp_dir: default_temp_dir(),
            file_limit: default_file_limit(),
            default_storage_id: None,
        }
    }
}

impl StorageSettings {
    /// Default number of files per sequence folder.
    pub const DEFAULT_FILE_LIMIT: usize = 100;

    /// Create settings rooted at `base_dir`, staging uploads in `temp_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            temp_dir: temp_dir.into(),
            ..Self::default()
        }
    }

    /// Set the per-folder file limit.
    #[must_use]
    pub fn with_file_limit(mut self, limit: usize) -> Self {
        self.file_limit = limit;
        self
    }

    /// Set the default storage backend id.
    #[must_use]
    pub fn with_default_storage_id(mut self, id: Uuid) -> Self {
        self.default_storage_id = Some(id);
        self
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./doc_store")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./doc_store_tmp")
}

fn default_file_limit() -> usize {
    StorageSettings::DEFAULT_FILE_LIMIT
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DOCVAULT").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_settings_defaults() {
        let settings = StorageSettings::default();
        assert_eq!(settings.base_dir, PathBuf::from("./doc_store"));
        assert_eq!(settings.temp_dir, PathBuf::from("./doc_store_tmp"));
        assert_eq!(settings.file_limit, 100);
        assert!(settings.default_storage_id.is_none());
    }

    #[test]
    fn test_storage_settings_builder() {
        let id = Uuid::new_v4();
        let settings = StorageSettings::new("/data/docs", "/data/tmp")
            .with_file_limit(2)
            .with_default_storage_id(id);
        assert_eq!(settings.base_dir, PathBuf::from("/data/docs"));
        assert_eq!(settings.temp_dir, PathBuf::from("/data/tmp"));
        assert_eq!(settings.file_limit, 2);
        assert_eq!(settings.default_storage_id, Some(id));
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("config-test-nonexistent")),
                (
                    "DOCVAULT__DATABASE__URL",
                    Some("postgres://localhost/docvault_test"),
                ),
                ("DOCVAULT__STORAGE__FILE_LIMIT", Some("25")),
                ("DOCVAULT__SERVER__PORT", Some("9090")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/docvault_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.storage.file_limit, 25);
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
            },
        );
    }
}
