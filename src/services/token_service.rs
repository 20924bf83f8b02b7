//! Credentials and tokens.
//!
//! This service handles:
//! - Session tokens (HS256 JWT) issued after password or passkey login
//! - Password hashing with Argon2
//! - Random single-use account tokens and their SHA-256 hashes

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{error::AppError, models::user::User};

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a session token for `user`, valid for `ttl_hours`.
pub fn issue_jwt(user: &User, secret: &str, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

/// Verify signature and expiry of a session token.
///
/// Every failure maps to `Unauthorized`; the reason is only logged.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthorized
    })
}

/// Hash a password into an Argon2 PHC string.
///
/// Runs on the blocking pool since Argon2 is deliberately slow.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, password_hashed: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&password_hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))
}

/// Generate a random account token (64 hex characters, 32 random bytes).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hash of a raw token, hex encoded. This is what the database stores.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: 42,
            name: "Ben".into(),
            email: "ben@example.com".into(),
            password_hashed: String::new(),
            passkey_handle: Uuid::new_v4(),
            is_admin: false,
            last_login: None,
            time_created: Utc::now(),
            time_confirmed: None,
        }
    }

    #[test]
    fn test_jwt_carries_identity() {
        let token = issue_jwt(&user(), "secret", 72).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ben@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let token = issue_jwt(&user(), "secret", 72).unwrap();
        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_jwt_rejects_expired_token() {
        let token = issue_jwt(&user(), "secret", -2).unwrap();
        assert!(verify_jwt(&token, "secret").is_err());
    }

    #[test]
    fn test_jwt_rejects_garbage() {
        assert!(verify_jwt("not.a.jwt", "secret").is_err());
    }

    #[tokio::test]
    async fn test_password_hash_verifies() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("x".into(), "plaintext".into()).await.unwrap());
    }

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
