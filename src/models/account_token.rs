//! Single-use account tokens (e-mail confirmation, password reset).
//!
//! The raw token is only ever sent to the user by e-mail. The database stores its SHA-256 hash.

use chrono::{DateTime, Duration, Utc};

/// Represents a row of the `account_tokens` table, as loaded for redemption.
///
/// The table stores only the SHA-256 hash of the raw token (64 hex characters).
/// When a request comes in with `?token=abc123`, we:
/// 1. Hash "abc123" with SHA-256
/// 2. Look up this hash with the expected purpose
/// 3. If found, unused and not expired, consume it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountToken {
    pub id: i32,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,

    /// Set once the token has been consumed
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    ConfirmEmail,
    ResetPassword,
}

impl TokenPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::ConfirmEmail => "confirm_email",
            TokenPurpose::ResetPassword => "reset_password",
        }
    }

    pub fn lifetime(self) -> Duration {
        match self {
            TokenPurpose::ConfirmEmail => Duration::hours(24),
            TokenPurpose::ResetPassword => Duration::hours(1),
        }
    }
}

impl AccountToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: Duration, used: bool) -> AccountToken {
        let now = Utc::now();
        AccountToken {
            id: 1,
            user_id: 7,
            expires_at: now + expires_in,
            used_at: used.then_some(now),
        }
    }

    #[test]
    fn test_usable_only_when_fresh_and_unused() {
        let now = Utc::now();
        assert!(token(Duration::minutes(5), false).is_usable(now));
        assert!(!token(Duration::minutes(5), true).is_usable(now));
        assert!(!token(Duration::minutes(-5), false).is_usable(now));
    }

    #[test]
    fn test_reset_tokens_are_short_lived() {
        assert!(TokenPurpose::ResetPassword.lifetime() < TokenPurpose::ConfirmEmail.lifetime());
    }
}
