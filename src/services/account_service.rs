//! Account repository - users, credentials and personal collections.
//!
//! This service handles:
//! - Registration and password login
//! - E-mail confirmation and password reset tokens
//! - Movie collections (primary database)
//! - LDS collections (ids in the primary database, content in the LDS database)

use chrono::Utc;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        account_token::{AccountToken, TokenPurpose},
        movie::Movie,
        user::{Collection, User, normalize_email},
    },
    services::token_service,
};

const USER_COLUMNS: &str = "id, name, email, password_hashed, passkey_handle, is_admin, last_login, time_created, time_confirmed";

/// Create a user with an already validated request.
///
/// # Errors
///
/// - `EmailTaken`: an account (deleted or not) already uses this e-mail
/// - `Database`: Database error occurred
pub async fn register(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: String,
    is_admin: bool,
) -> Result<User, AppError> {
    let email = normalize_email(email);

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = $1)")
            .bind(&email)
            .fetch_one(pool)
            .await?;
    if taken {
        return Err(AppError::EmailTaken);
    }

    let password_hashed = token_service::hash_password(password).await?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hashed, is_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(name.trim())
    .bind(&email)
    .bind(password_hashed)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        // Lost a race with a concurrent registration
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::EmailTaken,
        other => AppError::Database(other),
    })?;

    tracing::info!(target: "movies", user_id = user.id, "user registered");
    Ok(user)
}

/// Check e-mail and password, record the login time.
///
/// Unknown e-mail, deleted account and wrong password all return `InvalidCredentials`.
pub async fn authenticate(pool: &DbPool, email: &str, password: String) -> Result<User, AppError> {
    let user = find_active_by_email(pool, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !token_service::verify_password(password, user.password_hashed.clone()).await? {
        tracing::info!(target: "movies", user_id = user.id, "failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    touch_last_login(pool, user.id).await?;
    Ok(user)
}

pub async fn touch_last_login(pool: &DbPool, user_id: i32) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_active_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1 AND time_deleted IS NULL"
    ))
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_active_by_id(pool: &DbPool, user_id: i32) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND time_deleted IS NULL"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Create a single-use token and return the raw value (to be e-mailed).
///
/// Older unused tokens of the same purpose are invalidated.
pub async fn issue_account_token(
    pool: &DbPool,
    user_id: i32,
    purpose: TokenPurpose,
) -> Result<String, AppError> {
    let token = token_service::generate_token();
    let expires_at = Utc::now() + purpose.lifetime();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE account_tokens SET used_at = NOW() WHERE user_id = $1 AND purpose = $2 AND used_at IS NULL",
    )
    .bind(user_id)
    .bind(purpose.as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO account_tokens (user_id, token_hash, purpose, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(token_service::hash_token(&token))
    .bind(purpose.as_str())
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(token)
}

/// Consume a token inside `tx`, returning the owning user id.
///
/// The row is locked so the same token cannot be redeemed twice concurrently.
async fn consume_account_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    raw_token: &str,
    purpose: TokenPurpose,
) -> Result<i32, AppError> {
    let token = sqlx::query_as::<_, AccountToken>(
        r#"
        SELECT id, user_id, expires_at, used_at
        FROM account_tokens
        WHERE token_hash = $1 AND purpose = $2
        FOR UPDATE
        "#,
    )
    .bind(token_service::hash_token(raw_token.trim()))
    .bind(purpose.as_str())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::InvalidToken)?;

    if !token.is_usable(Utc::now()) {
        return Err(AppError::InvalidToken);
    }

    sqlx::query("UPDATE account_tokens SET used_at = NOW() WHERE id = $1")
        .bind(token.id)
        .execute(&mut **tx)
        .await?;

    Ok(token.user_id)
}

/// Mark the account behind a confirmation token as confirmed.
pub async fn confirm_email(pool: &DbPool, raw_token: &str) -> Result<i32, AppError> {
    let mut tx = pool.begin().await?;

    let user_id = consume_account_token(&mut tx, raw_token, TokenPurpose::ConfirmEmail).await?;

    sqlx::query("UPDATE users SET time_confirmed = COALESCE(time_confirmed, NOW()) WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(target: "movies", user_id, "email confirmed");
    Ok(user_id)
}

/// Replace the password of the account behind a reset token.
pub async fn reset_password(
    pool: &DbPool,
    raw_token: &str,
    new_password: String,
) -> Result<i32, AppError> {
    let password_hashed = token_service::hash_password(new_password).await?;

    let mut tx = pool.begin().await?;

    let user_id = consume_account_token(&mut tx, raw_token, TokenPurpose::ResetPassword).await?;

    sqlx::query("UPDATE users SET password_hashed = $1 WHERE id = $2")
        .bind(password_hashed)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(target: "movies", user_id, "password reset");
    Ok(user_id)
}

/// Add a movie to a collection. Saving twice is a no-op.
pub async fn save_movie_to_collection(
    pool: &DbPool,
    user_id: i32,
    movie_id: i32,
    collection: Collection,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO user_movies (user_id, movie_id, relation_type)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, movie_id, relation_type) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(collection.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a movie from a collection. Returns false when it was not there.
pub async fn remove_movie_from_collection(
    pool: &DbPool,
    user_id: i32,
    movie_id: i32,
    collection: Collection,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "DELETE FROM user_movies WHERE user_id = $1 AND movie_id = $2 AND relation_type = $3",
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(collection.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Movies in a user's collection, most recently added first.
pub async fn get_movie_collection(
    pool: &DbPool,
    user_id: i32,
    collection: Collection,
) -> Result<Vec<Movie>, AppError> {
    let movies = sqlx::query_as::<_, Movie>(
        r#"
        SELECT m.id, m.tmdb_id, m.title, m.tagline, m.release_year, m.overview,
               m.score, m.popularity, m.language, m.poster_url, m.trailer_url
        FROM movies m
        JOIN user_movies um ON um.movie_id = m.id
        WHERE um.user_id = $1 AND um.relation_type = $2
        ORDER BY um.time_added DESC
        "#,
    )
    .bind(user_id)
    .bind(collection.as_str())
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

pub async fn save_lds_to_collection(
    pool: &DbPool,
    user_id: i32,
    lds_id: i32,
    collection: Collection,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO user_lds (user_id, lds_id, relation_type)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, lds_id, relation_type) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(lds_id)
    .bind(collection.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove_lds_from_collection(
    pool: &DbPool,
    user_id: i32,
    lds_id: i32,
    collection: Collection,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "DELETE FROM user_lds WHERE user_id = $1 AND lds_id = $2 AND relation_type = $3",
    )
    .bind(user_id)
    .bind(lds_id)
    .bind(collection.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// LDS ids in a user's collection, most recently added first.
pub async fn get_lds_collection_ids(
    pool: &DbPool,
    user_id: i32,
    collection: Collection,
) -> Result<Vec<i32>, AppError> {
    let ids = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT lds_id FROM user_lds
        WHERE user_id = $1 AND relation_type = $2
        ORDER BY time_added DESC
        "#,
    )
    .bind(user_id)
    .bind(collection.as_str())
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Collections an LDS item belongs to for a user.
pub async fn get_lds_collections_for_item(
    pool: &DbPool,
    user_id: i32,
    lds_id: i32,
) -> Result<Vec<Collection>, AppError> {
    let relations = sqlx::query_scalar::<_, String>(
        "SELECT relation_type FROM user_lds WHERE user_id = $1 AND lds_id = $2",
    )
    .bind(user_id)
    .bind(lds_id)
    .fetch_all(pool)
    .await?;

    Ok(relations
        .iter()
        .filter_map(|r| Collection::parse(r).ok())
        .collect())
}
