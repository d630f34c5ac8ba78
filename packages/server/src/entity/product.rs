use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub description: String,

    /// Stored trimmed and upper-cased; the unique index is the backstop
    /// for concurrent creators racing the uniqueness check.
    #[sea_orm(unique)]
    pub sku: String,

    pub manufacturer: String,

    /// Constrained to [0, 100] by the request validator.
    pub quantity: i32,

    /// Immutable after creation.
    pub owner_user_id: i32,

    #[sea_orm(belongs_to, from = "owner_user_id", to = "id")]
    pub owner: BelongsTo<super::user::Entity>,

    #[sea_orm(has_many)]
    pub images: HasMany<super::image::Entity>,

    pub date_added: DateTimeUtc,
    pub date_last_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
