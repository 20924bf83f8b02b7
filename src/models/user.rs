//! User account models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity representing a registered account
//! - Request bodies for registration, login, password reset and collections
//! - `AuthResponse` / `MessageResponse`: response bodies returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{lds::LdsContent, movie::Movie},
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Represents an active user record from the `users` table.
///
/// Soft-deleted rows (`time_deleted` set) are never loaded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,

    /// Argon2 PHC string, never serialized
    pub password_hashed: String,

    /// Stable WebAuthn user handle
    pub passkey_handle: Uuid,

    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub time_created: DateTime<Utc>,
    pub time_confirmed: Option<DateTime<Utc>>,
}

/// Request body for `POST /api/account/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidRequest("Name is required".to_string()));
        }
        if !looks_like_email(&self.email) {
            return Err(AppError::InvalidRequest("A valid email is required".to_string()));
        }
        validate_password(&self.password)
    }
}

/// Request body for `POST /api/account/authenticate`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

/// Response for login-like operations.
///
/// # JSON Example
///
/// ```json
/// {
///   "success": true,
///   "message": "User authenticated successfully",
///   "jwt": "eyJhbGciOiJIUzI1NiJ9..."
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub jwt: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// A user's personal list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Favorite,
    Watchlist,
}

impl Collection {
    /// Value stored in the `relation_type` columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Favorite => "favorite",
            Collection::Watchlist => "watchlist",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "favorite" | "favorites" => Ok(Collection::Favorite),
            "watchlist" => Ok(Collection::Watchlist),
            _ => Err(AppError::InvalidRequest(
                "collection must be favorite or watchlist".to_string(),
            )),
        }
    }
}

/// Body of the movie collection endpoints.
///
/// `collection` stays a string so that an unknown name yields a 400 with a
/// useful message instead of a generic deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct MovieCollectionRequest {
    pub movie_id: i32,
    pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct LdsCollectionRequest {
    pub lds_id: i32,
    pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct LdsIdQuery {
    pub lds_id: i32,
}

/// Response of `GET /api/account/details`.
#[derive(Debug, Serialize)]
pub struct AccountDetails {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub confirmed: bool,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub member_since: DateTime<Utc>,
    pub favorites: Vec<Movie>,
    pub watchlist: Vec<Movie>,
    pub lds_favorites: Vec<LdsContent>,
    pub lds_watchlist: Vec<LdsContent>,
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Cheap shape check: one `@`, non-empty local part, dotted domain, no spaces.
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// E-mails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("ben@phoenixflix.app"));
        assert!(looks_like_email(" a.b@c.co "));
        assert!(!looks_like_email("no-at-sign.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@localhost"));
        assert!(!looks_like_email("a@b@c.com"));
        assert!(!looks_like_email("a b@c.com"));
        assert!(!looks_like_email("a@.com"));
    }

    #[test]
    fn test_collection_parsing() {
        assert_eq!(Collection::parse("favorite").unwrap(), Collection::Favorite);
        assert_eq!(Collection::parse("Favorites").unwrap(), Collection::Favorite);
        assert_eq!(Collection::parse("watchlist").unwrap(), Collection::Watchlist);
        assert!(matches!(
            Collection::parse("wishlist"),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_register_validation() {
        let mut request = RegisterRequest {
            name: "Ben".into(),
            email: "ben@example.com".into(),
            password: "correct horse".into(),
        };
        assert!(request.validate().is_ok());

        request.password = "short".into();
        assert!(request.validate().is_err());

        request.password = "long enough".into();
        request.name = "  ".into();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ben@Example.COM "), "ben@example.com");
    }

    #[test]
    fn test_account_details_report_login_history() {
        let joined = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let details = AccountDetails {
            id: 1,
            name: "Ben".into(),
            email: "ben@example.com".into(),
            confirmed: true,
            is_admin: false,
            last_login: None,
            member_since: joined,
            favorites: vec![],
            watchlist: vec![],
            lds_favorites: vec![],
            lds_watchlist: vec![],
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["member_since"], "2024-01-02T03:04:05Z");
        assert!(json["last_login"].is_null());
    }
}
