use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "affiliates")]
pub struct Model {
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    /// Percentage, 0 to 100.
    #[sea_orm(default_value = 0.0)]
    pub commission: f64,
    /// Denormalized count of `affiliate_clicks` rows.
    #[sea_orm(default_value = 0)]
    pub clicks: i32,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
    #[sea_orm(has_many)]
    pub click_rows: HasMany<super::affiliate_click::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
