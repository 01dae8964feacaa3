//! Storage backend configuration types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use docvault_shared::types::StorageId;

use super::error::StorageError;

/// Kind of backend that owns a document's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Local filesystem under the configured base directory.
    LocalFs,
    /// Azure Blob Storage container.
    AzureBlob,
}

impl StorageKind {
    /// Convert to database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalFs => "local_fs",
            Self::AzureBlob => "azure_blob",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local_fs" => Some(Self::LocalFs),
            "azure_blob" => Some(Self::AzureBlob),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured storage backend.
///
/// Administered outside the core; providers only read it while initializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocStorageType {
    /// Identifier documents reference through `storage_id`.
    pub id: StorageId,
    /// Human-readable label.
    pub name: String,
    /// Backend discriminator.
    pub storage_type: StorageKind,
    /// Backend-specific key/value configuration.
    #[serde(default)]
    pub config_param: HashMap<String, String>,
}

impl DocStorageType {
    /// Create a storage type with an empty parameter map.
    #[must_use]
    pub fn new(id: StorageId, name: impl Into<String>, storage_type: StorageKind) -> Self {
        Self {
            id,
            name: name.into(),
            storage_type,
            config_param: HashMap::new(),
        }
    }

    /// Add a configuration parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_param.insert(key.into(), value.into());
        self
    }

    /// Fail with `ConfigMismatch` unless this configuration targets `expected`.
    pub fn ensure_kind(&self, expected: StorageKind) -> Result<(), StorageError> {
        if self.storage_type == expected {
            Ok(())
        } else {
            Err(StorageError::ConfigMismatch {
                expected,
                actual: self.storage_type,
            })
        }
    }
}

/// Azure Blob connection settings derived from a storage type's parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobConnection {
    /// `http` or `https`.
    pub protocol: String,
    /// Storage account name.
    pub account_name: String,
    /// Base64 encoded account key.
    pub account_key: String,
    /// Blob service endpoint, without trailing slash.
    pub blob_endpoint: String,
    /// Target container.
    pub container: String,
}

impl fmt::Debug for BlobConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobConnection")
            .field("protocol", &self.protocol)
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .field("container", &self.container)
            .finish()
    }
}

impl BlobConnection {
    /// Parameter holding a complete connection string.
    pub const CONNECTION_STRING: &'static str = "connection_string";
    /// Parameter naming the endpoint protocol.
    pub const PROTOCOL: &'static str = "DefaultEndpointsProtocol";
    /// Parameter naming the storage account.
    pub const ACCOUNT_NAME: &'static str = "AccountName";
    /// Parameter holding the account key.
    pub const ACCOUNT_KEY: &'static str = "AccountKey";
    /// Parameter holding the blob endpoint.
    pub const BLOB_ENDPOINT: &'static str = "BlobEndpoint";
    /// Parameter naming the container.
    pub const CONTAINER_NAME: &'static str = "container_name";
    /// Container used when none is configured.
    pub const DEFAULT_CONTAINER: &'static str = "documents";

    /// Build connection settings from `config_param`.
    ///
    /// The parameters are first assembled into an Azure connection string,
    /// which is then parsed, so both a full `connection_string` parameter and
    /// individual fields are accepted.
    pub fn from_config_params(params: &HashMap<String, String>) -> Result<Self, StorageError> {
        let connection_string = match params.get(Self::CONNECTION_STRING) {
            Some(conn) => conn.clone(),
            None => Self::build_connection_string(params)?,
        };

        let container = params
            .get(Self::CONTAINER_NAME)
            .map_or(Self::DEFAULT_CONTAINER, String::as_str);

        Self::parse(&connection_string, container)
    }

    /// Assemble `DefaultEndpointsProtocol=…;AccountName=…;AccountKey=…;BlobEndpoint=…;`.
    pub fn build_connection_string(
        params: &HashMap<String, String>,
    ) -> Result<String, StorageError> {
        let required = |key: &str| {
            params
                .get(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::configuration(format!("missing '{key}' parameter")))
        };

        let mut conn = format!(
            "{}={};{}={};{}={};",
            Self::PROTOCOL,
            params.get(Self::PROTOCOL).map_or("https", String::as_str),
            Self::ACCOUNT_NAME,
            required(Self::ACCOUNT_NAME)?,
            Self::ACCOUNT_KEY,
            required(Self::ACCOUNT_KEY)?,
        );
        if let Some(endpoint) = params.get(Self::BLOB_ENDPOINT) {
            conn.push_str(&format!("{}={endpoint};", Self::BLOB_ENDPOINT));
        }
        Ok(conn)
    }

    /// Parse an Azure storage connection string.
    pub fn parse(connection_string: &str, container: &str) -> Result<Self, StorageError> {
        let fields: HashMap<&str, &str> = connection_string
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .filter_map(|part| part.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let field = |key: &str| {
            fields
                .get(key)
                .filter(|v| !v.is_empty())
                .map(|v| (*v).to_string())
                .ok_or_else(|| {
                    StorageError::configuration(format!("connection string is missing '{key}'"))
                })
        };

        let protocol = fields
            .get(Self::PROTOCOL)
            .map_or_else(|| "https".to_string(), |v| (*v).to_string());
        let account_name = field(Self::ACCOUNT_NAME)?;
        let account_key = field(Self::ACCOUNT_KEY)?;
        let blob_endpoint = fields.get(Self::BLOB_ENDPOINT).map_or_else(
            || format!("{protocol}://{account_name}.blob.core.windows.net"),
            |v| v.trim_end_matches('/').to_string(),
        );

        if container.is_empty() {
            return Err(StorageError::configuration("container name must not be empty"));
        }

        Ok(Self {
            protocol,
            account_name,
            account_key,
            blob_endpoint,
            container: container.to_string(),
        })
    }
}
