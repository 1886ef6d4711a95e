use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

/// Polymorphic link: `(model_type, model_id)` names any record, so only the
/// media side carries a foreign key.
#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "model_has_media")]
pub struct Model {
    #[sea_orm(indexed)]
    pub model_type: String,
    #[sea_orm(indexed)]
    pub model_id: Uuid,
    pub field_type: String,
    #[sea_orm(indexed)]
    pub media_id: Uuid,
    #[sea_orm(belongs_to, from = "media_id", to = "id", on_delete = "Cascade")]
    pub media: HasOne<super::media::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
