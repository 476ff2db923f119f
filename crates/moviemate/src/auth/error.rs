//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Authentication and authorization errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing authorization header.
    #[error("missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    /// Unknown username or wrong password.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// Malformed, expired or badly signed token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token is valid but its user no longer exists.
    #[error("user no longer exists")]
    IdentityNotFound,

    /// Authenticated user does not own the target resource.
    #[error("permission denied")]
    PermissionDenied,

    /// The credential store failed.
    #[error("credential store unavailable")]
    StoreUnavailable,

    /// Malformed input.
    #[error("{0}")]
    Validation(String),

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidCredentials
            | AuthError::InvalidToken(_)
            | AuthError::IdentityNotFound => StatusCode::UNAUTHORIZED,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::StoreUnavailable | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub(crate) fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "MISSING_AUTH_HEADER",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::IdentityNotFound => "IDENTITY_NOT_FOUND",
            AuthError::PermissionDenied => "PERMISSION_DENIED",
            AuthError::StoreUnavailable | AuthError::Internal(_) => "INTERNAL_ERROR",
            AuthError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Message safe to show to the caller.
    pub(crate) fn public_message(&self) -> String {
        match self {
            AuthError::StoreUnavailable | AuthError::Internal(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Error response body shared by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::StoreUnavailable | AuthError::Internal(_) => {
                tracing::error!(error_code = self.error_code(), error = %self, "Auth failure");
            }
            _ => {
                tracing::debug!(error_code = self.error_code(), error = %self, "Auth rejected");
            }
        }

        let body = Json(AuthErrorResponse {
            error: self.public_message(),
            code: self.error_code(),
        });

        (status, body).into_response()
    }
}
