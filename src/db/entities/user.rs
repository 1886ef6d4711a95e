use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(
    Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel,
)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sea_orm(unique)]
    pub name: Option<String>,
    #[sea_orm(indexed)]
    pub role_id: Uuid,
    #[sea_orm(default_value = 0)]
    pub login_attempts: i32,
    pub last_login_attempt: Option<DateTimeWithTimeZone>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTimeWithTimeZone>,
    #[sea_orm(belongs_to, from = "role_id", to = "id")]
    pub role: HasOne<super::role::Entity>,
    #[sea_orm(has_many)]
    pub affiliates: HasMany<super::affiliate::Entity>,
    #[sea_orm(has_many)]
    pub tokens: HasMany<super::token::Entity>,
    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
