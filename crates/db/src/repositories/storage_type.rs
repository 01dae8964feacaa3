//! Storage backend configuration repository.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;

use docvault_core::document::{DocumentError, StorageTypeRepository as StorageTypeRepoTrait};
use docvault_core::storage::{DocStorageType, StorageKind};
use docvault_shared::types::StorageId;

use crate::entities::doc_storage_types;

/// Storage type repository implementation.
#[derive(Debug, Clone)]
pub struct StorageTypeRepository {
    db: DatabaseConnection,
}

impl StorageTypeRepository {
    /// Create a new storage type repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, storage_type: DocStorageType) -> Result<DocStorageType, DocumentError> {
        let now = Utc::now();
        let active_model = doc_storage_types::ActiveModel {
            id: Set(storage_type.id.into_inner()),
            name: Set(storage_type.name),
            storage_type: Set(storage_type.storage_type.as_str().to_string()),
            config_param: Set(params_to_json(&storage_type.config_param)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?;

        to_domain(model)
    }
}

impl StorageTypeRepoTrait for StorageTypeRepository {
    async fn find_by_id(&self, id: StorageId) -> Result<Option<DocStorageType>, DocumentError> {
        doc_storage_types::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| DocumentError::repository(e.to_string()))?
            .map(to_domain)
            .transpose()
    }
}

/// Convert database model to domain model.
fn to_domain(model: doc_storage_types::Model) -> Result<DocStorageType, DocumentError> {
    let storage_type = StorageKind::parse(&model.storage_type).ok_or_else(|| {
        DocumentError::repository(format!("unknown storage type '{}'", model.storage_type))
    })?;

    Ok(DocStorageType {
        id: StorageId::from_uuid(model.id),
        name: model.name,
        storage_type,
        config_param: params_from_json(&model.config_param),
    })
}

/// Flatten a JSON object into string parameters; non-string scalars are
/// rendered as JSON text.
fn params_from_json(value: &Value) -> HashMap<String, String> {
    value
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn params_to_json(params: &HashMap<String, String>) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_from_json() {
        let params = params_from_json(&json!({
            "AccountName": "acme",
            "port": 10000,
            "unset": null
        }));

        assert_eq!(params.get("AccountName").map(String::as_str), Some("acme"));
        assert_eq!(params.get("port").map(String::as_str), Some("10000"));
        assert!(!params.contains_key("unset"));
    }

    #[test]
    fn test_params_from_non_object_is_empty() {
        assert!(params_from_json(&json!("nope")).is_empty());
        assert!(params_from_json(&Value::Null).is_empty());
    }

    #[test]
    fn test_to_domain_rejects_unknown_kind() {
        let model = doc_storage_types::Model {
            id: uuid::Uuid::new_v4(),
            name: "legacy".to_string(),
            storage_type: "ftp".to_string(),
            config_param: json!({}),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };

        let err = to_domain(model).unwrap_err();
        assert!(matches!(err, DocumentError::Repository(msg) if msg.contains("ftp")));
    }

    #[test]
    fn test_params_round_trip() {
        let params = HashMap::from([("container_name".to_string(), "contracts".to_string())]);
        assert_eq!(params_from_json(&params_to_json(&params)), params);
    }
}
