use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Email-shaped, case-sensitive login identifier.
    #[sea_orm(unique)]
    pub username: String,

    /// Argon2 PHC hash, never serialized to clients.
    pub password: String,

    pub first_name: String,
    pub last_name: String,

    #[sea_orm(has_many)]
    pub products: HasMany<super::product::Entity>,

    pub account_created: DateTimeUtc,
    pub account_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
