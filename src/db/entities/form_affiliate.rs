use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "form_affiliates")]
pub struct Model {
    pub username: String,
    pub link: String,
    pub code: String,
    pub email: String,
}

impl ActiveModelBehavior for ActiveModel {}
