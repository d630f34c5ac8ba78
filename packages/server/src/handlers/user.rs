use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{UserResponse, validate_create_user, validate_update_user};
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    post,
    path = "/v2/user",
    tag = "Users",
    operation_id = "createUser",
    summary = "Register a new user",
    description = "Creates a user account. The body must contain exactly `username` (an email \
        address), `password`, `first_name` and `last_name`. The password is stored as an \
        irreversible hash and never returned.",
    request_body(content_type = "application/json", description = "Registration fields"),
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid body or duplicate username", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let new_user = validate_create_user(&payload)?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(&new_user.username))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let hashed = hash::hash_password(&new_user.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let model = user::ActiveModel {
        username: Set(new_user.username),
        password: Set(hashed),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        account_created: Set(now),
        account_updated: Set(now),
        ..Default::default()
    };

    let created = model.insert(&state.db).await.map_err(|e| match e.sql_err() {
        // Concurrent registration race: the unique index is the backstop.
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
        _ => AppError::from(e),
    })?;

    tracing::info!(user_id = created.id, "user registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/v2/user/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    description = "Returns the authenticated user's own record; requesting any other id is \
        forbidden. The password hash is never included.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the authenticated user", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(auth_user), fields(user_id))]
pub async fn get_user(
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_self(user_id)?;

    Ok(Json(UserResponse::from(auth_user)))
}

#[utoipa::path(
    put,
    path = "/v2/user/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update the authenticated user",
    description = "Replaces the password and display names. The body must contain exactly \
        `password`, `first_name` and `last_name`; the username is immutable.",
    params(("id" = i32, Path, description = "User ID")),
    request_body(content_type = "application/json", description = "Update fields"),
    responses(
        (status = 204, description = "User updated"),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Not the authenticated user", body = ErrorBody),
    ),
    security(("basic_auth" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    AppJson(payload): AppJson<Map<String, Value>>,
) -> Result<StatusCode, AppError> {
    auth_user.require_self(user_id)?;

    let update = validate_update_user(&payload)?;

    let hashed = hash::hash_password(&update.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let existing = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("authenticated user row missing".into()))?;

    let mut active: user::ActiveModel = existing.into();
    active.password = Set(hashed);
    active.first_name = Set(update.first_name);
    active.last_name = Set(update.last_name);
    active.account_updated = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    tracing::info!(user_id, "user updated");

    Ok(StatusCode::NO_CONTENT)
}
