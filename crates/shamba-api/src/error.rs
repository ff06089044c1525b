//! API error handling
//!
//! Every failure leaves the API as `{ "message": ..., "code": ... }`.
//! Server-side failures are logged in full and reported with a generic
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shamba_auth::AuthError;
use shamba_db::DbError;
use thiserror::Error;
use utoipa::ToSchema;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Body returned for server-side failures
pub const SERVER_ERROR_MESSAGE: &str = "Server Error";

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
    // =========================================================================
    // Request Errors (400)
    // =========================================================================
    /// Field-level rule violations, already joined
    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    /// Duplicate unique value, e.g. a registered email
    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // =========================================================================
    // Authentication & Authorization Errors (401, 403)
    // =========================================================================
    #[error("{0}")]
    Unauthorized(AuthError),

    #[error("{0}")]
    Forbidden(String),

    // =========================================================================
    // Resource Errors (404, 413)
    // =========================================================================
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    // =========================================================================
    // Internal Errors (500)
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ApiError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "DUPLICATE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized(err) => err.error_code(),
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::Conflict(_)
            | Self::InvalidCredentials => StatusCode::BAD_REQUEST,

            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,

            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client
    pub fn client_message(&self) -> String {
        if self.status_code().is_server_error() {
            SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message
    pub message: String,
    /// Machine-readable code
    pub code: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.client_message(),
            code: err.error_code().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::UserNotFound => Self::Unauthorized(err),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::WeakPassword(msg) => Self::Validation(msg),
            AuthError::PasswordHashingFailed | AuthError::Internal(_) => {
                Self::Internal(err.to_string())
            }
            AuthError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => Self::NotFound(msg),
            DbError::Duplicate(msg) => Self::Conflict(msg),
            other => {
                tracing::error!(error = ?other, "Database error");
                Self::Database(other.to_string())
            }
        }
    }
}

/// Domain rule violations (messages, discussion posts) surface verbatim
impl From<shamba_types::ValidationErrors> for ApiError {
    fn from(errors: shamba_types::ValidationErrors) -> Self {
        Self::BadRequest(errors.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(format_validation_errors(&errors))
    }
}

/// Join field messages in field-name order so the text is stable
pub fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}
