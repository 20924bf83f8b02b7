//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from repository queries
/// - **Authentication Errors**: Missing/invalid session tokens, wrong credentials
/// - **Authorization Errors**: Authenticated caller lacks admin rights
/// - **Resource Errors**: Requested movie, LDS item, user or entry not found
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bearer token is missing, malformed, expired or has a bad signature.
    #[error("Authentication required")]
    Unauthorized,

    /// Login failed. Unknown e-mail and wrong password share this variant.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Caller is authenticated but not an administrator.
    #[error("Administrator access required")]
    Forbidden,

    /// The named resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Registration with an e-mail that already has an account.
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Request body or parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Confirmation or reset token is unknown, used or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// A WebAuthn ceremony could not be started or verified.
    #[error("Passkey error: {0}")]
    Passkey(String),

    /// Unexpected failure outside the database (hashing, signing, ...).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::EmailTaken => (StatusCode::CONFLICT, "email_taken", self.to_string()),
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::InvalidToken => (StatusCode::BAD_REQUEST, "invalid_token", self.to_string()),
            AppError::Passkey(msg) => (StatusCode::BAD_REQUEST, "passkey_error", msg.clone()),
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        }
    }
}

/// Malformed or missing JSON bodies answer with the standard error body.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "success": false,
///   "message": "Human-readable error message",
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// `Database` and `Internal` → 500 with details hidden from the client (they are logged instead).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Database(_) | AppError::Internal(_)) {
            tracing::error!(error = %self, "request failed");
        }

        let (status, code, message) = self.parts();

        let body = Json(json!({
            "success": false,
            "message": message,
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_names_the_resource() {
        let (status, body) = body_json(AppError::NotFound("Movie")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["message"], "Movie not found");
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_details() {
        let (status, body) =
            body_json(AppError::InvalidRequest("collection must be favorite or watchlist".into()))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "collection must be favorite or watchlist");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, body) = body_json(AppError::Internal("argon2 exploded".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("argon2"));
    }

    #[tokio::test]
    async fn test_auth_error_statuses() {
        assert_eq!(body_json(AppError::Unauthorized).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(AppError::InvalidCredentials).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(AppError::Forbidden).await.0, StatusCode::FORBIDDEN);
        assert_eq!(body_json(AppError::EmailTaken).await.0, StatusCode::CONFLICT);
    }
}
