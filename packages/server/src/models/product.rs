use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::product;
use crate::error::AppError;

/// The complete recognized field set for product bodies.
pub const PRODUCT_FIELDS: [&str; 5] = ["name", "description", "sku", "manufacturer", "quantity"];

/// Inclusive quantity bounds.
pub const QUANTITY_MIN: i64 = 0;
pub const QUANTITY_MAX: i64 = 100;

/// Which field-set contract a product body must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// All five fields required, nothing else (POST).
    Create,
    /// Identical contract to create (PUT).
    Replace,
    /// Any non-empty subset of the five fields (PATCH).
    Patch,
}

/// Normalized output of product body validation. Fields absent from a
/// patch body stay `None`; create/replace always fill all five.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Trimmed and upper-cased.
    pub sku: Option<String>,
    pub manufacturer: Option<String>,
    pub quantity: Option<i32>,
}

/// Validate and normalize a product body against the given mode.
///
/// Pure function: performs no persistence, returns the normalized field
/// set or the first applicable error. SKU normalization (trim + upper-case)
/// happens here so the uniqueness check and storage always see the
/// canonical form.
pub fn validate_product_body(
    mode: ValidationMode,
    body: &Map<String, Value>,
) -> Result<ProductFields, AppError> {
    for key in body.keys() {
        if !PRODUCT_FIELDS.contains(&key.as_str()) {
            return Err(AppError::UnknownField(key.clone()));
        }
    }

    match mode {
        ValidationMode::Create | ValidationMode::Replace => {
            if body.len() != PRODUCT_FIELDS.len() {
                return Err(AppError::Validation(
                    "Request body must contain exactly name, description, sku, manufacturer and quantity"
                        .into(),
                ));
            }
        }
        ValidationMode::Patch => {
            if body.is_empty() {
                return Err(AppError::Validation("Request body must not be empty".into()));
            }
        }
    }

    let mut fields = ProductFields::default();

    for field in ["name", "description", "manufacturer"] {
        if let Some(value) = body.get(field) {
            let text = value.as_str().ok_or(AppError::InvalidFieldType(field))?;
            match field {
                "name" => fields.name = Some(text.to_string()),
                "description" => fields.description = Some(text.to_string()),
                _ => fields.manufacturer = Some(text.to_string()),
            }
        }
    }

    if let Some(value) = body.get("sku") {
        let raw = value.as_str().ok_or(AppError::InvalidFieldType("sku"))?;
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(AppError::InvalidSku);
        }
        fields.sku = Some(normalized);
    }

    if let Some(value) = body.get("quantity") {
        // Floats (3.5, but also 100.0) and non-numbers all land here as
        // the same kind, per the quantity contract.
        let quantity = value.as_i64().ok_or(AppError::InvalidQuantity)?;
        if !(QUANTITY_MIN..=QUANTITY_MAX).contains(&quantity) {
            return Err(AppError::InvalidQuantity);
        }
        fields.quantity = Some(quantity as i32);
    }

    Ok(fields)
}

/// Fully-populated body for the create and full-replace paths.
#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub sku: String,
    pub manufacturer: String,
    pub quantity: i32,
}

/// Validate a create/replace body, where all five fields must be present.
pub fn validate_full_product_body(
    mode: ValidationMode,
    body: &Map<String, Value>,
) -> Result<NewProduct, AppError> {
    let fields = validate_product_body(mode, body)?;
    match (
        fields.name,
        fields.description,
        fields.sku,
        fields.manufacturer,
        fields.quantity,
    ) {
        (Some(name), Some(description), Some(sku), Some(manufacturer), Some(quantity)) => {
            Ok(NewProduct {
                name,
                description,
                sku,
                manufacturer,
                quantity,
            })
        }
        _ => Err(AppError::Validation(
            "Request body must contain exactly name, description, sku, manufacturer and quantity"
                .into(),
        )),
    }
}

/// Response DTO for a product.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    /// Product ID.
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Widget")]
    pub name: String,
    pub description: String,
    /// Normalized (upper-case) stock keeping unit, unique across products.
    #[schema(example = "WID-001")]
    pub sku: String,
    pub manufacturer: String,
    /// On-hand quantity in [0, 100].
    #[schema(example = 12)]
    pub quantity: i32,
    /// ID of the owning user.
    pub owner_user_id: i32,
    pub date_added: DateTime<Utc>,
    pub date_last_updated: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            sku: model.sku,
            manufacturer: model.manufacturer,
            quantity: model.quantity,
            owner_user_id: model.owner_user_id,
            date_added: model.date_added,
            date_last_updated: model.date_last_updated,
        }
    }
}
