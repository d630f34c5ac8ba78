use axum::{extract::FromRequestParts, http::request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use validator::ValidateEmail;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::hash;

/// Authenticated principal extracted from the `Authorization: Basic` header.
///
/// Add this as a handler parameter to require authentication. Credentials
/// are re-verified against the database on every request (no sessions or
/// tokens), so the extractor runs before any body validation. The password
/// hash is stripped here and never travels further.
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub account_created: chrono::DateTime<chrono::Utc>,
    pub account_updated: chrono::DateTime<chrono::Utc>,
}

impl AuthUser {
    /// Returns `Ok(())` if the principal is the user with the given id,
    /// `Err(Forbidden)` otherwise.
    pub fn require_self(&self, user_id: i32) -> Result<(), AppError> {
        if self.id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Split the Basic header value into (username, password).
///
/// Missing header material is an authentication failure; structurally
/// malformed material is a credential-format error (400).
fn decode_basic(auth_header: &str) -> Result<(String, String), AppError> {
    let encoded = auth_header
        .strip_prefix("Basic ")
        .ok_or(AppError::InvalidCredentialFormat)?;

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| AppError::InvalidCredentialFormat)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AppError::InvalidCredentialFormat)?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or(AppError::InvalidCredentialFormat)?;

    if !username.validate_email() || password.is_empty() {
        return Err(AppError::InvalidCredentialFormat);
    }

    Ok((username.to_string(), password.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::AuthenticationFailed)?;

        let (username, password) = decode_basic(auth_header)?;

        let user = user::Entity::find()
            .filter(user::Column::Username.eq(&username))
            .one(&state.db)
            .await?
            .ok_or(AppError::AuthenticationFailed)?;

        let is_valid = hash::verify_password(&password, &user.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

        if !is_valid {
            return Err(AppError::AuthenticationFailed);
        }

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            account_created: user.account_created,
            account_updated: user.account_updated,
        })
    }
}
