use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "media")]
pub struct Model {
    pub uuid: Uuid,
    /// Original client file name.
    pub name: String,
    /// Path relative to the upload root: `{media id}/{stored name}`.
    pub file_name: String,
    pub mime_type: String,
    pub disk: String,
    pub size: i64,
    #[sea_orm(indexed)]
    pub collection_name: String,
    pub custom_properties: Json,
    #[sea_orm(indexed)]
    pub user_id: Option<Uuid>,
    #[sea_orm(has_many)]
    pub links: HasMany<super::model_has_media::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
