use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(
    Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel,
)]
#[sea_orm(table_name = "role_permissions")]
pub struct Model {
    #[sea_orm(indexed)]
    pub role_id: Uuid,
    #[sea_orm(indexed)]
    pub permission_id: Uuid,
    #[sea_orm(belongs_to, from = "role_id", to = "id", on_delete = "Cascade")]
    pub role: HasOne<super::role::Entity>,
    #[sea_orm(belongs_to, from = "permission_id", to = "id", on_delete = "Cascade")]
    pub permission: HasOne<super::permission::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
