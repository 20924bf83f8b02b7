//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): primary PostgreSQL connection string (movies, users, guestbook)
/// - `DATABASE_URL_LDS` (required): PostgreSQL connection string for the LDS content database
/// - `JWT_SECRET` (required): HMAC secret used to sign session tokens
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 8080
/// - `WEBAUTHN_RP_ID`, `WEBAUTHN_RP_ORIGIN`, `WEBAUTHN_RP_NAME` (optional): passkey relying party
/// - `RESEND_API_KEY` (optional): when unset, outgoing mail is only logged
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub database_url_lds: String,

    pub jwt_secret: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_jwt_ttl_hours")]
    pub jwt_ttl_hours: i64,

    #[serde(default = "default_rp_id")]
    pub webauthn_rp_id: String,

    #[serde(default = "default_rp_origin")]
    pub webauthn_rp_origin: String,

    #[serde(default = "default_rp_name")]
    pub webauthn_rp_name: String,

    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    #[serde(default = "default_base_url")]
    pub app_base_url: String,

    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Comma separated list of e-mails granted guestbook moderation.
    #[serde(default)]
    pub admin_emails: String,
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    5
}

fn default_jwt_ttl_hours() -> i64 {
    72
}

fn default_rp_id() -> String {
    "localhost".to_string()
}

fn default_rp_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_rp_name() -> String {
    "PhoenixFlix".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_mail_from() -> String {
    "PhoenixFlix <noreply@phoenixflix.app>".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL_LDS)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url_lds -> DATABASE_URL_LDS
        envy::from_env::<Config>()
    }

    /// Normalized administrator e-mails (trimmed, lowercase, no blanks).
    pub fn admin_email_list(&self) -> Vec<String> {
        self.admin_emails
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_email_list().iter().any(|e| *e == email)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/phoenixflix".to_string(),
        database_url_lds: "postgres://localhost/phoenixflix_lds".to_string(),
        jwt_secret: "test-secret".to_string(),
        server_port: default_port(),
        db_max_connections: default_max_connections(),
        jwt_ttl_hours: default_jwt_ttl_hours(),
        webauthn_rp_id: default_rp_id(),
        webauthn_rp_origin: default_rp_origin(),
        webauthn_rp_name: default_rp_name(),
        public_dir: default_public_dir(),
        app_base_url: default_base_url(),
        resend_api_key: None,
        mail_from: default_mail_from(),
        admin_emails: " Admin@Example.com, ,moderator@example.com".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_email_list_is_normalized() {
        let config = test_config();
        assert_eq!(
            config.admin_email_list(),
            vec!["admin@example.com", "moderator@example.com"]
        );
    }

    #[test]
    fn test_is_admin_email_ignores_case() {
        let config = test_config();
        assert!(config.is_admin_email("ADMIN@example.com"));
        assert!(!config.is_admin_email("someone@example.com"));
    }

    #[test]
    fn test_defaults_apply_for_optional_fields() {
        let config: Config = envy::from_iter([
            ("DATABASE_URL".to_string(), "postgres://a".to_string()),
            ("DATABASE_URL_LDS".to_string(), "postgres://b".to_string()),
            ("JWT_SECRET".to_string(), "s".to_string()),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.jwt_ttl_hours, 72);
        assert_eq!(config.webauthn_rp_id, "localhost");
        assert!(config.resend_api_key.is_none());
        assert!(config.admin_email_list().is_empty());
    }

    #[test]
    fn test_missing_lds_url_is_an_error() {
        let result = envy::from_iter::<_, Config>([
            ("DATABASE_URL".to_string(), "postgres://a".to_string()),
            ("JWT_SECRET".to_string(), "s".to_string()),
        ]);
        assert!(result.is_err());
    }
}
