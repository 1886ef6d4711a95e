use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "affiliate_clicks")]
pub struct Model {
    #[sea_orm(indexed)]
    pub affiliate_id: Uuid,
    pub ip_address: String,
    #[sea_orm(column_type = "Text")]
    pub user_agent: String,
    /// One-time token from the landing page; a second click with it is a replay.
    #[sea_orm(unique)]
    pub token: String,
    #[sea_orm(belongs_to, from = "affiliate_id", to = "id", on_delete = "Cascade")]
    pub affiliate: HasOne<super::affiliate::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
