use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// ApiError
///
/// The application's error taxonomy. Every failure surfaced by the auth
/// resolver, the access policy, or a resource service is one of these
/// variants; the `IntoResponse` impl maps each to its status code and the
/// failure envelope `{ success: false, message, statusCode }`.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400
    #[error("Validation error: {0}")]
    Validation(String),

    // 401
    #[error("Access token required")]
    AccessTokenRequired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid token format")]
    InvalidTokenFormat,
    #[error("Invalid email or password")]
    InvalidCredentials,

    // 403
    #[error("Access denied")]
    AccessDenied,
    #[error("Admin access required")]
    AdminAccessRequired,

    // 404
    #[error("User not found")]
    UserNotFound,
    #[error("Article not found")]
    ArticleNotFound,

    // 409
    #[error("User with this email already exists")]
    UserAlreadyExists,

    // 500 -- the inner detail is logged, never sent to the client.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AccessTokenRequired
            | ApiError::InvalidToken
            | ApiError::InvalidTokenFormat
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AccessDenied | ApiError::AdminAccessRequired => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::ArticleNotFound => StatusCode::NOT_FOUND,
            ApiError::UserAlreadyExists => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ErrorBody
///
/// The failure envelope serialized for every non-2xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "internal error");
        }

        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // The only unique constraint in the schema is users.email.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::UserAlreadyExists;
            }
        }
        ApiError::Internal(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        // Only reached on the signing path; verification maps errors itself.
        ApiError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
