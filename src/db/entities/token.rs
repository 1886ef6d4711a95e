use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(
    Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel,
)]
#[sea_orm(table_name = "tokens")]
pub struct Model {
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(column_type = "Text")]
    #[serde(skip_serializing)]
    pub token: String,
    /// `access` or `refresh`.
    pub kind: String,
    pub expires_at: DateTimeWithTimeZone,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
