//! WebAuthn passkey HTTP handlers.
//!
//! - POST /api/passkey/registration-begin (JWT)
//! - POST /api/passkey/registration-end (JWT)
//! - POST /api/passkey/authentication-begin
//! - POST /api/passkey/authentication-end

use axum::{Extension, Json, extract::State};
use webauthn_rs::prelude::{
    CreationChallengeResponse, PublicKeyCredential, RegisterPublicKeyCredential,
    RequestChallengeResponse,
};

use crate::{
    error::AppError,
    handlers::extract::ApiJson,
    middleware::auth::AuthContext,
    models::{
        passkey::{AuthenticationBeginRequest, RegistrationBeginRequest},
        user::{AuthResponse, MessageResponse},
    },
    services::{
        account_service,
        passkey_service::{self, PendingLogin},
        token_service,
    },
    state::AppState,
};

/// Start registering a passkey for the logged-in user.
///
/// The response is passed as-is to `navigator.credentials.create()`.
/// Credentials the user already owns are excluded.
pub async fn registration_begin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<RegistrationBeginRequest>,
) -> Result<Json<CreationChallengeResponse>, AppError> {
    let user = account_service::find_active_by_id(&state.db, auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let display_name = request
        .username
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or(auth.name);

    let exclude: Vec<_> = passkey_service::list_passkeys(&state.db, user.id)
        .await?
        .into_iter()
        .map(|stored| stored.passkey.0.cred_id().clone())
        .collect();

    let (challenge, registration) = state
        .webauthn
        .start_passkey_registration(
            user.passkey_handle,
            &user.email,
            &display_name,
            Some(exclude),
        )
        .map_err(|e| AppError::Passkey(format!("Could not start registration: {e}")))?;

    state
        .passkey_sessions
        .registrations
        .put(user.id, registration)
        .await;

    Ok(Json(challenge))
}

/// Verify the attestation from `navigator.credentials.create()` and store the passkey.
pub async fn registration_end(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(credential): ApiJson<RegisterPublicKeyCredential>,
) -> Result<Json<MessageResponse>, AppError> {
    let registration = state
        .passkey_sessions
        .registrations
        .take(&auth.user_id)
        .await
        .ok_or_else(|| AppError::Passkey("No registration in progress".to_string()))?;

    let passkey = state
        .webauthn
        .finish_passkey_registration(&credential, &registration)
        .map_err(|e| {
            tracing::info!(user_id = auth.user_id, error = %e, "passkey registration rejected");
            AppError::Passkey("Passkey registration failed".to_string())
        })?;

    passkey_service::save_passkey(&state.db, auth.user_id, &passkey).await?;

    Ok(Json(MessageResponse::ok("Passkey registered")))
}

/// Start a passkey login for the account with the given e-mail.
///
/// # Response
///
/// - **Success (200 OK)**: options for `navigator.credentials.get()`
/// - **Error (404)**: unknown e-mail or no passkeys registered
pub async fn authentication_begin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AuthenticationBeginRequest>,
) -> Result<Json<RequestChallengeResponse>, AppError> {
    let user = account_service::find_active_by_email(&state.db, &request.email)
        .await?
        .ok_or(AppError::NotFound("Passkey"))?;

    let passkeys: Vec<_> = passkey_service::list_passkeys(&state.db, user.id)
        .await?
        .into_iter()
        .map(|stored| stored.passkey.0)
        .collect();

    if passkeys.is_empty() {
        return Err(AppError::NotFound("Passkey"));
    }

    let (challenge, authentication) = state
        .webauthn
        .start_passkey_authentication(&passkeys)
        .map_err(|e| AppError::Passkey(format!("Could not start authentication: {e}")))?;

    let challenge_key = passkey_service::options_challenge(&challenge)?;
    state
        .passkey_sessions
        .logins
        .put(
            challenge_key,
            PendingLogin {
                user_id: user.id,
                state: authentication,
            },
        )
        .await;

    Ok(Json(challenge))
}

/// Verify the assertion from `navigator.credentials.get()` and log the user in.
///
/// The challenge inside `clientDataJSON` selects the pending login. It is
/// only consumed once the assertion verifies for the credential's owner.
pub async fn authentication_end(
    State(state): State<AppState>,
    ApiJson(credential): ApiJson<PublicKeyCredential>,
) -> Result<Json<AuthResponse>, AppError> {
    let client_data: &[u8] = credential.response.client_data_json.as_ref();
    let challenge_key = passkey_service::assertion_challenge(client_data)?;

    let credential_id = passkey_service::credential_key(&credential.raw_id)?;
    let owner = passkey_service::find_owner(&state.db, &credential_id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let result = state
        .passkey_sessions
        .logins
        .complete(&challenge_key, |pending| {
            if pending.user_id != owner {
                return Err(AppError::InvalidCredentials);
            }
            state
                .webauthn
                .finish_passkey_authentication(&credential, &pending.state)
                .map_err(|e| {
                    tracing::info!(user_id = owner, error = %e, "passkey assertion rejected");
                    AppError::InvalidCredentials
                })
        })
        .await
        .ok_or_else(|| AppError::Passkey("No authentication in progress".to_string()))??;

    let user = account_service::find_active_by_id(&state.db, owner)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    passkey_service::record_authentication(&state.db, user.id, &result).await?;
    account_service::touch_last_login(&state.db, user.id).await?;

    let jwt = token_service::issue_jwt(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;

    tracing::info!(target: "movies", user_id = user.id, "user authenticated with passkey");
    Ok(Json(AuthResponse {
        success: true,
        message: "User authenticated successfully".to_string(),
        jwt,
    }))
}
