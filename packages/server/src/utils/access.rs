use sea_orm::EntityTrait;

use crate::entity::product;
use crate::error::AppError;

/// Look up a product and verify the acting principal owns it.
///
/// Existence is checked before ownership, so a missing product is always a
/// 404 and never leaks into a 403. Every product-scoped mutation and every
/// image endpoint goes through here; the single-product GET is the one
/// deliberately unauthenticated read.
pub async fn find_owned_product<C: sea_orm::ConnectionTrait>(
    db: &C,
    product_id: i32,
    user_id: i32,
) -> Result<product::Model, AppError> {
    let product = product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(AppError::ProductNotFound)?;

    if product.owner_user_id != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(product)
}

/// Look up a product by id, returning 404 if not found.
pub async fn find_product<C: sea_orm::ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(AppError::ProductNotFound)
}
