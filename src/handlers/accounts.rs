//! Account management HTTP handlers.
//!
//! Public endpoints:
//! - POST /api/account/register - Create account
//! - POST /api/account/authenticate - Password login
//! - GET /api/account/confirm?token= - Confirm e-mail address
//! - POST /api/account/forgot-password - Request password reset mail
//! - POST /api/account/reset-password - Set a new password with a reset token
//!
//! Authenticated endpoints:
//! - GET /api/account/details, /favorites, /watchlist
//! - POST /api/account/save-movie-to-collection, /remove-movie-from-collection
//! - POST /api/account/resend-verification

use axum::{
    Extension, Json,
    extract::State,
};

use crate::{
    error::AppError,
    handlers::{
        extract::{ApiJson, ApiQuery},
        lds::load_lds_collection,
    },
    middleware::auth::AuthContext,
    models::{
        account_token::TokenPurpose,
        movie::Movie,
        user::{
            AccountDetails, AuthResponse, Collection, ConfirmQuery, ForgotPasswordRequest,
            LoginRequest, MessageResponse, MovieCollectionRequest, RegisterRequest,
            ResetPasswordRequest, User, validate_password,
        },
    },
    services::{account_service, movie_service, token_service},
    state::AppState,
};

/// Register a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Ben",
///   "email": "ben@example.com",
///   "password": "correct horse battery"
/// }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true, "message": "...", "jwt": "..."}`
/// - **Error (400)**: validation failed
/// - **Error (409)**: e-mail already registered
///
/// A confirmation mail is sent; failing to send it does not fail registration.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    request.validate()?;

    let is_admin = state.config.is_admin_email(&request.email);
    let user = account_service::register(
        &state.db,
        &request.name,
        &request.email,
        request.password,
        is_admin,
    )
    .await?;

    send_confirmation(&state, &user).await;

    let jwt = token_service::issue_jwt(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "User registered successfully".to_string(),
        jwt,
    }))
}

/// Password login.
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true, "message": "...", "jwt": "..."}`
/// - **Error (401)**: unknown e-mail or wrong password
pub async fn authenticate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = account_service::authenticate(&state.db, &request.email, request.password).await?;

    let jwt = token_service::issue_jwt(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;

    tracing::info!(target: "movies", user_id = user.id, "user authenticated");
    Ok(Json(AuthResponse {
        success: true,
        message: "User authenticated successfully".to_string(),
        jwt,
    }))
}

pub async fn confirm_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ConfirmQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    account_service::confirm_email(&state.db, &query.token).await?;
    Ok(Json(MessageResponse::ok("Email confirmed")))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = account_service::find_active_by_id(&state.db, auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.time_confirmed.is_some() {
        return Ok(Json(MessageResponse::ok("Email already confirmed")));
    }

    send_confirmation(&state, &user).await;
    Ok(Json(MessageResponse::ok("Verification email sent")))
}

/// Request a password reset link.
///
/// Always answers success so that the endpoint cannot be used to discover which
/// e-mails have accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if let Some(user) = account_service::find_active_by_email(&state.db, &request.email).await? {
        let token =
            account_service::issue_account_token(&state.db, user.id, TokenPurpose::ResetPassword)
                .await?;
        if let Err(e) = state.mailer.send_password_reset(&user.email, &token).await {
            tracing::error!(user_id = user.id, error = %e, "failed to send password reset mail");
        }
    }

    Ok(Json(MessageResponse::ok(
        "If an account exists for this email, a reset link has been sent",
    )))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_password(&request.new_password)?;

    account_service::reset_password(&state.db, &request.token, request.new_password).await?;

    Ok(Json(MessageResponse::ok("Password updated")))
}

/// Profile plus every collection of the caller.
pub async fn get_account_details(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<AccountDetails>, AppError> {
    let user = account_service::find_active_by_id(&state.db, auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let favorites =
        account_service::get_movie_collection(&state.db, user.id, Collection::Favorite).await?;
    let watchlist =
        account_service::get_movie_collection(&state.db, user.id, Collection::Watchlist).await?;
    let lds_favorites = load_lds_collection(&state, user.id, Collection::Favorite).await?;
    let lds_watchlist = load_lds_collection(&state, user.id, Collection::Watchlist).await?;

    Ok(Json(AccountDetails {
        id: user.id,
        is_admin: auth.is_admin,
        confirmed: user.time_confirmed.is_some(),
        last_login: user.last_login,
        member_since: user.time_created,
        name: user.name,
        email: user.email,
        favorites,
        watchlist,
        lds_favorites,
        lds_watchlist,
    }))
}

pub async fn get_favorites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies =
        account_service::get_movie_collection(&state.db, auth.user_id, Collection::Favorite)
            .await?;
    Ok(Json(movies))
}

pub async fn get_watchlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies =
        account_service::get_movie_collection(&state.db, auth.user_id, Collection::Watchlist)
            .await?;
    Ok(Json(movies))
}

/// Add a movie to the caller's favorites or watchlist.
///
/// # Request Body
///
/// ```json
/// { "movie_id": 77, "collection": "watchlist" }
/// ```
///
/// Saving the same movie twice is not an error.
pub async fn save_movie_to_collection(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<MovieCollectionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let collection = Collection::parse(&request.collection)?;

    if !movie_service::movie_exists(&state.db, request.movie_id).await? {
        return Err(AppError::NotFound("Movie"));
    }

    account_service::save_movie_to_collection(
        &state.db,
        auth.user_id,
        request.movie_id,
        collection,
    )
    .await?;

    tracing::info!(target: "movies", user_id = auth.user_id, movie_id = request.movie_id, collection = collection.as_str(), "saved to collection");
    Ok(Json(MessageResponse::ok(format!(
        "Movie added to {}",
        collection.as_str()
    ))))
}

pub async fn remove_movie_from_collection(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<MovieCollectionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let collection = Collection::parse(&request.collection)?;

    let removed = account_service::remove_movie_from_collection(
        &state.db,
        auth.user_id,
        request.movie_id,
        collection,
    )
    .await?;

    let message = if removed {
        format!("Movie removed from {}", collection.as_str())
    } else {
        format!("Movie was not in {}", collection.as_str())
    };
    Ok(Json(MessageResponse::ok(message)))
}

/// Issue a confirmation token and mail it. Failures are logged only.
async fn send_confirmation(state: &AppState, user: &User) {
    let token = match account_service::issue_account_token(
        &state.db,
        user.id,
        TokenPurpose::ConfirmEmail,
    )
    .await
    {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "failed to issue confirmation token");
            return;
        }
    };

    if let Err(e) = state
        .mailer
        .send_confirmation(&user.email, &user.name, &token)
        .await
    {
        tracing::error!(user_id = user.id, error = %e, "failed to send confirmation mail");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    #[tokio::test]
    async fn test_unknown_collection_is_rejected_before_lookup() {
        let auth = AuthContext {
            user_id: 1,
            email: "ben@example.com".into(),
            name: "Ben".into(),
            is_admin: false,
        };
        let result = save_movie_to_collection(
            State(test_state()),
            Extension(auth),
            ApiJson(MovieCollectionRequest {
                movie_id: 77,
                collection: "wishlist".into(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
