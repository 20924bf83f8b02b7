//! Guestbook repository.

use crate::{
    db::DbPool,
    error::AppError,
    models::guestbook::{CreateEntryRequest, GuestbookEntry},
};

const ENTRY_COLUMNS: &str = "id, name, email, comment, message_type, is_approved, created_at";

/// Approved public entries, newest first.
pub async fn list_visible_entries(pool: &DbPool) -> Result<Vec<GuestbookEntry>, AppError> {
    let entries = sqlx::query_as::<_, GuestbookEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS} FROM guestbook_entries
        WHERE is_approved = true AND message_type = 'public'
        ORDER BY created_at DESC
        "#
    ))
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// One entry, only if it is approved and public.
pub async fn get_visible_entry(
    pool: &DbPool,
    entry_id: i32,
) -> Result<Option<GuestbookEntry>, AppError> {
    let entry = sqlx::query_as::<_, GuestbookEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS} FROM guestbook_entries
        WHERE id = $1 AND is_approved = true AND message_type = 'public'
        "#
    ))
    .bind(entry_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Store a sanitized entry. New entries await moderation.
pub async fn create_entry(
    pool: &DbPool,
    request: &CreateEntryRequest,
) -> Result<GuestbookEntry, AppError> {
    let entry = sqlx::query_as::<_, GuestbookEntry>(&format!(
        r#"
        INSERT INTO guestbook_entries (name, email, comment, message_type, is_approved)
        VALUES ($1, $2, $3, $4, false)
        RETURNING {ENTRY_COLUMNS}
        "#
    ))
    .bind(&request.name)
    .bind(&request.email)
    .bind(&request.comment)
    .bind(request.message_type.as_str())
    .fetch_one(pool)
    .await?;

    tracing::info!(target: "movies", entry_id = entry.id, "guestbook entry created");
    Ok(entry)
}

/// Every entry, pending ones first, then newest first.
pub async fn list_all_entries(pool: &DbPool) -> Result<Vec<GuestbookEntry>, AppError> {
    let entries = sqlx::query_as::<_, GuestbookEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM guestbook_entries ORDER BY is_approved ASC, created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

pub async fn delete_entry(pool: &DbPool, entry_id: i32) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM guestbook_entries WHERE id = $1")
        .bind(entry_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Guestbook entry"));
    }

    Ok(())
}

pub async fn set_approval(pool: &DbPool, entry_id: i32, approved: bool) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE guestbook_entries SET is_approved = $1 WHERE id = $2")
        .bind(approved)
        .bind(entry_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Guestbook entry"));
    }

    Ok(())
}
