use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Immutable back-reference for ownership-chain checks.
    pub product_id: i32,

    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: BelongsTo<super::product::Entity>,

    /// Original upload filename.
    pub file_name: String,

    /// Opaque blob-store locator, minted per upload and never reused.
    #[sea_orm(unique)]
    pub s3_key: String,

    pub date_created: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
