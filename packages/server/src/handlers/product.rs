use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::entity::{image, product};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::image::delete_blob_best_effort;
use crate::models::product::{
    ProductResponse, ValidationMode, validate_full_product_body, validate_product_body,
};
use crate::state::AppState;
use crate::utils::access::{find_owned_product, find_product};

#[utoipa::path(
    post,
    path = "/v2/product",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Creates a product owned by the authenticated user. The body must contain \
        exactly `name`, `description`, `sku`, `manufacturer` and `quantity`. The SKU is trimmed \
        and upper-cased, and must be unique across all products.",
    request_body(content_type = "application/json", description = "Product fields"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid body or SKU conflict", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let new_product = validate_full_product_body(ValidationMode::Create, &payload)?;

    if sku_taken(&state.db, &new_product.sku, None).await? {
        return Err(AppError::SkuTaken);
    }

    let now = chrono::Utc::now();
    let model = product::ActiveModel {
        name: Set(new_product.name),
        description: Set(new_product.description),
        sku: Set(new_product.sku),
        manufacturer: Set(new_product.manufacturer),
        quantity: Set(new_product.quantity),
        owner_user_id: Set(auth_user.id),
        date_added: Set(now),
        date_last_updated: Set(now),
        ..Default::default()
    };

    let created = model.insert(&state.db).await.map_err(map_sku_violation)?;

    tracing::info!(product_id = created.id, sku = %created.sku, "product created");

    Ok((StatusCode::CREATED, Json(ProductResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/v2/product/{id}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product by ID",
    description = "Returns a product. This read is intentionally unauthenticated; image access \
        and all mutations require ownership.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(product_id))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = find_product(&state.db, product_id).await?;

    Ok(Json(product.into()))
}

#[utoipa::path(
    put,
    path = "/v2/product/{id}",
    tag = "Products",
    operation_id = "replaceProduct",
    summary = "Replace a product",
    description = "Full replacement with the same body contract as create. Only the owner may \
        replace a product.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "application/json", description = "Product fields"),
    responses(
        (status = 204, description = "Product replaced"),
        (status = 400, description = "Invalid body or SKU conflict", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(product_id))]
pub async fn replace_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    AppJson(payload): AppJson<Map<String, Value>>,
) -> Result<StatusCode, AppError> {
    let existing = find_owned_product(&state.db, product_id, auth_user.id).await?;

    let replacement = validate_full_product_body(ValidationMode::Replace, &payload)?;

    if sku_taken(&state.db, &replacement.sku, Some(product_id)).await? {
        return Err(AppError::SkuTaken);
    }

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(replacement.name);
    active.description = Set(replacement.description);
    active.sku = Set(replacement.sku);
    active.manufacturer = Set(replacement.manufacturer);
    active.quantity = Set(replacement.quantity);
    active.date_last_updated = Set(chrono::Utc::now());
    active.update(&state.db).await.map_err(map_sku_violation)?;

    tracing::info!(product_id, "product replaced");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/v2/product/{id}",
    tag = "Products",
    operation_id = "patchProduct",
    summary = "Partially update a product",
    description = "Updates any non-empty subset of `name`, `description`, `sku`, `manufacturer` \
        and `quantity`; unknown keys are rejected. Only the owner may update a product.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "application/json", description = "Subset of product fields"),
    responses(
        (status = 204, description = "Product updated"),
        (status = 400, description = "Invalid body or SKU conflict", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(product_id))]
pub async fn patch_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    AppJson(payload): AppJson<Map<String, Value>>,
) -> Result<StatusCode, AppError> {
    let existing = find_owned_product(&state.db, product_id, auth_user.id).await?;

    let fields = validate_product_body(ValidationMode::Patch, &payload)?;

    if let Some(ref sku) = fields.sku
        && sku_taken(&state.db, sku, Some(product_id)).await?
    {
        return Err(AppError::SkuTaken);
    }

    let mut active: product::ActiveModel = existing.into();
    if let Some(name) = fields.name {
        active.name = Set(name);
    }
    if let Some(description) = fields.description {
        active.description = Set(description);
    }
    if let Some(sku) = fields.sku {
        active.sku = Set(sku);
    }
    if let Some(manufacturer) = fields.manufacturer {
        active.manufacturer = Set(manufacturer);
    }
    if let Some(quantity) = fields.quantity {
        active.quantity = Set(quantity);
    }
    active.date_last_updated = Set(chrono::Utc::now());
    active.update(&state.db).await.map_err(map_sku_violation)?;

    tracing::info!(product_id, "product updated");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v2/product/{id}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Deletes a product and all its images. Blob objects are removed best-effort \
        before the rows; a failed blob deletion is logged and does not abort the cascade.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Product not found", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user), fields(product_id))]
pub async fn delete_product(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    find_owned_product(&state.db, product_id, auth_user.id).await?;

    // Not a transaction: each step is attempted regardless of earlier blob
    // failures, and partial completion is tolerated (orphans are logged).
    let images = image::Entity::find()
        .filter(image::Column::ProductId.eq(product_id))
        .all(&state.db)
        .await?;

    for img in &images {
        delete_blob_best_effort(&*state.blob_store, &img.s3_key).await;
    }

    image::Entity::delete_many()
        .filter(image::Column::ProductId.eq(product_id))
        .exec(&state.db)
        .await?;

    product::Entity::delete_by_id(product_id)
        .exec(&state.db)
        .await?;

    tracing::info!(product_id, image_count = images.len(), "product deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Check whether any other product already holds the normalized SKU.
///
/// `exclude_product` removes the record under update from the match so an
/// unchanged SKU never conflicts with itself.
async fn sku_taken<C: ConnectionTrait>(
    db: &C,
    sku: &str,
    exclude_product: Option<i32>,
) -> Result<bool, AppError> {
    let mut query = product::Entity::find().filter(product::Column::Sku.eq(sku));
    if let Some(id) = exclude_product {
        query = query.filter(product::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Map a unique-index violation on `products.sku` to the conflict error.
/// This is the backstop for creators racing the `sku_taken` check.
fn map_sku_violation(err: sea_orm::DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::SkuTaken,
        _ => AppError::from(err),
    }
}
