use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    /// `action:resource`, e.g. `create:post`.
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(has_many)]
    pub role_permissions: HasMany<super::role_permission::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
