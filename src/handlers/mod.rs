//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Calls into a service (repository queries, credential checks)
//! 3. Returns HTTP response (JSON, status code)

use crate::error::AppError;

/// Account, login and collection endpoints
pub mod accounts;
/// JSON body and query extractors with JSON rejections
pub mod extract;
/// Guestbook endpoints (public and moderation)
pub mod guestbook;
/// Health check endpoint
pub mod health;
/// LDS catalogue endpoints
pub mod lds;
/// Movie catalogue endpoints
pub mod movies;
/// Server-rendered pages and SPA fallback
pub mod pages;
/// WebAuthn passkey endpoints
pub mod passkeys;

/// Parse a numeric path segment, answering 400 instead of axum's plain-text rejection.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::InvalidRequest(format!("Invalid {what} id")))
}

#[cfg(test)]
mod tests {
    use super::parse_id;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("77", "movie").unwrap(), 77);
        assert!(parse_id("abc", "movie").is_err());
        assert!(parse_id("-3", "movie").is_err());
        assert!(parse_id("0", "movie").is_err());
    }
}
