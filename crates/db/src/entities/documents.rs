//! `SeaORM` Entity for documents table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub physical_path: Option<String>,
    pub author: Option<String>,
    pub doc_type: Option<String>,
    pub storage_id: Uuid,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::doc_storage_types::Entity",
        from = "Column::StorageId",
        to = "super::doc_storage_types::Column::Id"
    )]
    DocStorageTypes,
}

impl Related<super::doc_storage_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocStorageTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
