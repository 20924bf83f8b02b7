//! Passkey (WebAuthn credential) models.

use serde::Deserialize;
use sqlx::types::Json;
use webauthn_rs::prelude::Passkey;

/// Credential loaded from the `passkeys` table.
///
/// The credential itself is stored as the JSON serialization produced by
/// `webauthn-rs`. The table also keeps its base64url id in `credential_id`
/// so that an assertion can be routed to its owner with an indexed lookup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredPasskey {
    pub id: i32,
    pub passkey: Json<Passkey>,
}

/// Body of `POST /api/passkey/registration-begin`.
///
/// The browser sends the name to show in the authenticator UI; the account
/// name is used when it is missing.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationBeginRequest {
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of `POST /api/passkey/authentication-begin`.
#[derive(Debug, Deserialize)]
pub struct AuthenticationBeginRequest {
    pub email: String,
}
