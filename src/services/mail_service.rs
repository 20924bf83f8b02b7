//! Transactional e-mail (account confirmation, password reset).
//!
//! Mail goes out through the Resend HTTP API when `RESEND_API_KEY` is set.
//! Without a key the message is written to the log instead, which is what
//! local development uses.

use serde::Serialize;

use crate::{config::Config, error::AppError};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// Mail sender shared through the application state.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<String>,
    from: String,
    base_url: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        url::Url::parse(&config.app_base_url)
            .map_err(|e| AppError::Internal(format!("invalid APP_BASE_URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client error: {e}")))?;

        Ok(Self {
            client,
            api_key: config.resend_api_key.clone().filter(|k| !k.trim().is_empty()),
            from: config.mail_from.clone(),
            base_url: config.app_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/account/confirm?token={token}", self.base_url)
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/account/reset-password?token={token}", self.base_url)
    }

    pub async fn send_confirmation(&self, to: &str, name: &str, token: &str) -> Result<(), AppError> {
        let link = self.confirmation_link(token);
        let html = format!(
            "<p>Welcome to PhoenixFlix, {}!</p><p><a href=\"{link}\">Confirm your email address</a>. The link is valid for 24 hours.</p>",
            crate::handlers::pages::escape_html(name)
        );
        self.send(to, "Confirm your PhoenixFlix account", html).await
    }

    pub async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), AppError> {
        let link = self.reset_link(token);
        let html = format!(
            "<p>Someone asked to reset your PhoenixFlix password.</p><p><a href=\"{link}\">Choose a new password</a>. The link is valid for one hour. If this wasn't you, ignore this email.</p>"
        );
        self.send(to, "Reset your PhoenixFlix password", html).await
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), AppError> {
        let Some(ref api_key) = self.api_key else {
            tracing::info!(to, subject, body = %html, "mail delivery disabled, logging message");
            return Ok(());
        };

        let mail = OutgoingMail {
            from: &self.from,
            to: [to],
            subject,
            html,
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&mail)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("mail request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "mail provider returned {status}: {body}"
            )));
        }

        tracing::info!(to, subject, "mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_base_url_without_double_slash() {
        let mut config = crate::config::test_config();
        config.app_base_url = "https://phoenixflix.onrender.com/".into();
        let mailer = Mailer::from_config(&config).unwrap();
        assert_eq!(
            mailer.confirmation_link("abc"),
            "https://phoenixflix.onrender.com/account/confirm?token=abc"
        );
        assert_eq!(
            mailer.reset_link("abc"),
            "https://phoenixflix.onrender.com/account/reset-password?token=abc"
        );
    }

    #[tokio::test]
    async fn test_send_without_api_key_only_logs() {
        let config = crate::config::test_config();
        let mailer = Mailer::from_config(&config).unwrap();
        assert!(mailer.send_password_reset("ben@example.com", "tok").await.is_ok());
    }

    #[test]
    fn test_blank_api_key_disables_delivery() {
        let mut config = crate::config::test_config();
        config.resend_api_key = Some("  ".into());
        let mailer = Mailer::from_config(&config).unwrap();
        assert!(mailer.api_key.is_none());
    }

    #[test]
    fn test_relative_base_url_is_rejected() {
        let mut config = crate::config::test_config();
        config.app_base_url = "phoenixflix.local".into();
        assert!(Mailer::from_config(&config).is_err());
    }
}
