use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::entity::user;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Validated registration body.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Validated password/profile update body.
#[derive(Debug)]
pub struct UserUpdate {
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

const CREATE_FIELDS: [&str; 4] = ["username", "password", "first_name", "last_name"];
const UPDATE_FIELDS: [&str; 3] = ["password", "first_name", "last_name"];

/// Validate a registration body: exactly the four fields, all strings,
/// username email-shaped, password non-empty.
pub fn validate_create_user(body: &Map<String, Value>) -> Result<NewUser, AppError> {
    check_field_set(body, &CREATE_FIELDS)?;

    let username = require_string(body, "username")?;
    let password = require_string(body, "password")?;
    let first_name = require_string(body, "first_name")?;
    let last_name = require_string(body, "last_name")?;

    if !username.validate_email() {
        return Err(AppError::Validation(
            "Username must be a valid email address".into(),
        ));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }

    Ok(NewUser {
        username,
        password,
        first_name,
        last_name,
    })
}

/// Validate an update body: exactly {password, first_name, last_name}.
/// The username is immutable and its presence is an unknown-field error.
pub fn validate_update_user(body: &Map<String, Value>) -> Result<UserUpdate, AppError> {
    check_field_set(body, &UPDATE_FIELDS)?;

    let password = require_string(body, "password")?;
    let first_name = require_string(body, "first_name")?;
    let last_name = require_string(body, "last_name")?;

    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }

    Ok(UserUpdate {
        password,
        first_name,
        last_name,
    })
}

fn check_field_set(body: &Map<String, Value>, expected: &[&'static str]) -> Result<(), AppError> {
    for key in body.keys() {
        if !expected.contains(&key.as_str()) {
            return Err(AppError::UnknownField(key.clone()));
        }
    }
    if body.len() != expected.len() {
        return Err(AppError::Validation(format!(
            "Request body must contain exactly {}",
            expected.join(", ")
        )));
    }
    Ok(())
}

fn require_string(body: &Map<String, Value>, field: &'static str) -> Result<String, AppError> {
    body.get(field)
        .ok_or_else(|| AppError::Validation(format!("Field '{field}' is required")))?
        .as_str()
        .map(str::to_string)
        .ok_or(AppError::InvalidFieldType(field))
}

/// Response DTO for a user. The password hash is stripped by construction.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    /// User ID.
    #[schema(example = 3)]
    pub id: i32,
    /// Login identifier (email address).
    #[schema(example = "jane@example.com")]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub account_created: DateTime<Utc>,
    pub account_updated: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            account_created: model.account_created,
            account_updated: model.account_updated,
        }
    }
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            account_created: user.account_created,
            account_updated: user.account_updated,
        }
    }
}
