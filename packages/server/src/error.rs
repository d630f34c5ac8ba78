use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `UNKNOWN_FIELD`, `INVALID_FIELD_TYPE`, `INVALID_QUANTITY`,
    /// `INVALID_SKU`, `SKU_TAKEN`, `USERNAME_TAKEN`,
    /// `INVALID_CREDENTIAL_FORMAT`, `TOO_MANY_FILES`, `NO_FILE_PROVIDED`,
    /// `UNSUPPORTED_MEDIA_TYPE`, `AUTHENTICATION_FAILED`, `FORBIDDEN`,
    /// `PRODUCT_NOT_FOUND`, `IMAGE_NOT_FOUND`, `STORAGE_WRITE_FAILED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Request body must contain exactly name, description, sku, manufacturer and quantity")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Generic body-shape error (malformed JSON, missing required fields).
    Validation(String),
    /// A key outside the recognized field set was supplied.
    UnknownField(String),
    /// A textual field was present but not a JSON string.
    InvalidFieldType(&'static str),
    /// Quantity was not an integer in [0, 100].
    InvalidQuantity,
    /// SKU was empty after trimming.
    InvalidSku,
    /// Another product already holds the normalized SKU.
    SkuTaken,
    /// Another user already holds the username.
    UsernameTaken,
    /// Credential material was structurally malformed (non-Basic scheme,
    /// undecodable base64, non-email identifier, empty secret).
    InvalidCredentialFormat,
    TooManyFiles,
    NoFileProvided,
    UnsupportedMediaType,
    /// Missing header, unknown user, or wrong password.
    AuthenticationFailed,
    /// The authenticated principal does not own the resource.
    Forbidden,
    ProductNotFound,
    ImageNotFound,
    /// The image exists but belongs to a different product. Reported to the
    /// caller as not-found so image ids don't leak across products.
    ImageNotInProduct,
    /// The blob store rejected an upload; no image row was written.
    StorageWriteFailed,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::UnknownField(name) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "UNKNOWN_FIELD",
                    message: format!("Unknown field '{name}' in request body"),
                },
            ),
            AppError::InvalidFieldType(field) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_FIELD_TYPE",
                    message: format!("Field '{field}' must be a string"),
                },
            ),
            AppError::InvalidQuantity => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_QUANTITY",
                    message: "Quantity must be an integer between 0 and 100".into(),
                },
            ),
            AppError::InvalidSku => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_SKU",
                    message: "SKU must not be empty".into(),
                },
            ),
            AppError::SkuTaken => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "SKU_TAKEN",
                    message: "The given SKU is already taken".into(),
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "The given username already exists".into(),
                },
            ),
            AppError::InvalidCredentialFormat => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_CREDENTIAL_FORMAT",
                    message: "Username must be an email address and password must not be empty"
                        .into(),
                },
            ),
            AppError::TooManyFiles => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "TOO_MANY_FILES",
                    message: "Only one image can be uploaded per request".into(),
                },
            ),
            AppError::NoFileProvided => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "NO_FILE_PROVIDED",
                    message: "An image file must be provided in the 'image' field".into(),
                },
            ),
            AppError::UnsupportedMediaType => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "UNSUPPORTED_MEDIA_TYPE",
                    message: "Only JPG, JPEG and PNG files are allowed".into(),
                },
            ),
            AppError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "AUTHENTICATION_FAILED",
                    message: "Username or password is incorrect".into(),
                },
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "FORBIDDEN",
                    message: "You do not have access to this resource".into(),
                },
            ),
            AppError::ProductNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "PRODUCT_NOT_FOUND",
                    message: "Product with the given id does not exist".into(),
                },
            ),
            AppError::ImageNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "IMAGE_NOT_FOUND",
                    message: "Image with the given id does not exist".into(),
                },
            ),
            AppError::ImageNotInProduct => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "IMAGE_NOT_FOUND",
                    message: "Image not found for the given product".into(),
                },
            ),
            AppError::StorageWriteFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "STORAGE_WRITE_FAILED",
                    message: "Failed to store the uploaded image".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}
