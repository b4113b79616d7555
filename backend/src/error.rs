//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.
//!
//! Nothing rendered here may carry a password, a password hash or a
//! signing secret. Store failures are logged in full server-side and
//! reported to the client as a generic internal error.

use crate::auth::{AuthFailure, HashError, TokenError};
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use civic_board_shared::{AuthError, ErrorDetail, ErrorResponse, FieldError};
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error on {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Token rejected: {0}")]
    Token(#[from] TokenError),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Generic credential failure, identical for every cause
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized(AuthError::InvalidCredentials)
    }

    pub fn authentication_required() -> Self {
        ApiError::Unauthorized(AuthError::AuthenticationRequired)
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::InvalidField {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken => ApiError::Conflict("Username already taken".to_string()),
            StoreError::EmailTaken => ApiError::Conflict("Email already registered".to_string()),
            StoreError::Unavailable(source) => ApiError::StoreUnavailable(source),
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(err: AuthFailure) -> Self {
        match err {
            AuthFailure::InvalidCredentials => ApiError::invalid_credentials(),
            AuthFailure::Store(e) => e.into(),
            AuthFailure::Hash(e) => e.into(),
        }
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = match self {
            ApiError::InvalidField { field, message } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, Some(field))
            }
            ApiError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", reason.to_string(), None)
            }
            ApiError::Token(err) => {
                let reason = match err {
                    TokenError::Expired => AuthError::TokenExpired,
                    TokenError::Malformed | TokenError::MissingClaim => AuthError::InvalidToken,
                };
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", reason.to_string(), None)
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
                None,
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::StoreUnavailable(err) => {
                error!("Store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
