use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::image;

/// Response DTO for an image. Bytes live in the blob store; only the
/// locator travels over the wire.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    /// Image ID.
    #[schema(example = 11)]
    pub image_id: i32,
    /// Owning product ID.
    pub product_id: i32,
    /// Original upload filename.
    #[schema(example = "front.png")]
    pub file_name: String,
    /// Opaque blob-store locator.
    #[schema(example = "5e0f4b9e-6a5e-4d9e-9d57-3a1f4a2b9c01/front.png")]
    pub s3_bucket_path: String,
    pub date_created: DateTime<Utc>,
}

impl From<image::Model> for ImageResponse {
    fn from(model: image::Model) -> Self {
        Self {
            image_id: model.id,
            product_id: model.product_id,
            file_name: model.file_name,
            s3_bucket_path: model.s3_key,
            date_created: model.date_created,
        }
    }
}
