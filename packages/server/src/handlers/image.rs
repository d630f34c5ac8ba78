use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::storage::{BlobStore, ObjectKey};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::instrument;

use crate::entity::image;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::image::ImageResponse;
use crate::state::AppState;
use crate::utils::access::find_owned_product;
use crate::utils::filename::validate_flat_filename;

/// Content types accepted for product images.
const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Transport-level cap for upload requests; the configured
/// `storage.max_upload_size` is enforced per file below it.
pub fn image_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}

#[utoipa::path(
    post,
    path = "/v2/product/{id}/image",
    tag = "Product Images",
    operation_id = "uploadImage",
    summary = "Upload an image for a product",
    description = "Accepts exactly one multipart file in the `image` field (JPG, JPEG or PNG). \
        The payload is written to the blob store under a freshly minted locator before the \
        image record is created; locators are never reused.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Single `image` file field"),
    responses(
        (status = 201, description = "Image created", body = ImageResponse),
        (status = 400, description = "Missing/extra files or unsupported type", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
        (status = 500, description = "Blob store write failed", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(product_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    find_owned_product(&state.db, product_id, auth_user.id).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("image") {
            continue; // Ignore unknown fields.
        }
        if upload.is_some() {
            // Second `image` part: rejected before its bytes are read.
            return Err(AppError::TooManyFiles);
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or(AppError::NoFileProvided)?;
        let file_name = validate_flat_filename(&file_name)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()))
            .ok_or(AppError::UnsupportedMediaType)?;
        if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::UnsupportedMediaType);
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
        if data.len() > state.config.storage.max_upload_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                state.config.storage.max_upload_size
            )));
        }

        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) = upload.ok_or(AppError::NoFileProvided)?;

    let key = ObjectKey::mint(&file_name);
    if let Err(e) = state.blob_store.put(&key, &data).await {
        tracing::error!(locator = %key, error = %e, "blob write failed; upload rejected");
        return Err(AppError::StorageWriteFailed);
    }

    let new_image = image::ActiveModel {
        product_id: Set(product_id),
        file_name: Set(file_name),
        s3_key: Set(key.to_string()),
        date_created: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_image.insert(&state.db).await.map_err(|e| {
        // The blob is already written; its locator is logged for cleanup.
        tracing::error!(locator = %key, error = %e, "image row insert failed after blob write");
        AppError::from(e)
    })?;

    tracing::info!(product_id, image_id = model.id, locator = %key, "image uploaded");

    Ok((StatusCode::CREATED, Json(ImageResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/v2/product/{id}/image",
    tag = "Product Images",
    operation_id = "listImages",
    summary = "List images for a product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Image metadata list", body = Vec<ImageResponse>),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user), fields(product_id))]
pub async fn list_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    find_owned_product(&state.db, product_id, auth_user.id).await?;

    let images = image::Entity::find()
        .filter(image::Column::ProductId.eq(product_id))
        .order_by_asc(image::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/v2/product/{id}/image/{imageId}",
    tag = "Product Images",
    operation_id = "getImage",
    summary = "Get image metadata",
    description = "Returns metadata for a single image. An image belonging to a different \
        product is reported as not found.",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("imageId" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 200, description = "Image metadata", body = ImageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product or image not found", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user), fields(product_id, image_id))]
pub async fn get_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(i32, i32)>,
) -> Result<Json<ImageResponse>, AppError> {
    find_owned_product(&state.db, product_id, auth_user.id).await?;

    let img = find_product_image(&state.db, product_id, image_id).await?;

    Ok(Json(ImageResponse::from(img)))
}

#[utoipa::path(
    delete,
    path = "/v2/product/{id}/image/{imageId}",
    tag = "Product Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Removes the image record, then deletes the blob object best-effort. The \
        locator is never reused, so the relational delete may safely come first.",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("imageId" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product or image not found", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user), fields(product_id, image_id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((product_id, image_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    find_owned_product(&state.db, product_id, auth_user.id).await?;

    let img = find_product_image(&state.db, product_id, image_id).await?;

    image::Entity::delete_by_id(img.id).exec(&state.db).await?;
    delete_blob_best_effort(&*state.blob_store, &img.s3_key).await;

    tracing::info!(product_id, image_id, "image deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Look up an image and verify it belongs to the stated product.
///
/// A truly absent image and an image attached to a different product are
/// distinct failures internally, but both surface as 404.
async fn find_product_image<C: sea_orm::ConnectionTrait>(
    db: &C,
    product_id: i32,
    image_id: i32,
) -> Result<image::Model, AppError> {
    let img = image::Entity::find_by_id(image_id)
        .one(db)
        .await?
        .ok_or(AppError::ImageNotFound)?;

    if img.product_id != product_id {
        return Err(AppError::ImageNotInProduct);
    }

    Ok(img)
}

/// Attempt to delete a blob object, logging (never propagating) failures.
///
/// Cascade and single-image deletes tolerate orphaned blobs; the locator is
/// logged at error level for operator follow-up.
pub(crate) async fn delete_blob_best_effort(blob_store: &dyn BlobStore, key: &str) {
    match ObjectKey::parse(key) {
        Ok(parsed) => {
            if let Err(e) = blob_store.delete(&parsed).await {
                tracing::error!(locator = key, error = %e, "blob deletion failed; object orphaned");
            }
        }
        Err(e) => {
            tracing::error!(locator = key, error = %e, "stored locator failed to parse; blob orphaned");
        }
    }
}
