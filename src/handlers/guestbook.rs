//! Guestbook HTTP handlers.
//!
//! Public:
//! - GET /api/guestbook
//! - GET /api/guestbook/{id}
//! - POST /api/guestbook/create
//!
//! Administrators (JWT + admin):
//! - GET /api/admin/guestbook
//! - DELETE /api/admin/guestbook/delete/{id}
//! - PUT /api/admin/guestbook/approve/{id}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    handlers::{extract::ApiJson, parse_id},
    models::{
        guestbook::{
            AdminEntriesResponse, ApprovalRequest, CreateEntryRequest, CreateEntryResponse,
            PublicGuestbookEntry,
        },
        user::MessageResponse,
    },
    services::guestbook_service,
    state::AppState,
};

pub async fn get_all_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicGuestbookEntry>>, AppError> {
    let entries = guestbook_service::list_visible_entries(&state.db).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn get_entry_by_id(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<PublicGuestbookEntry>, AppError> {
    let entry_id = parse_id(&raw_id, "guestbook entry")?;

    let entry = guestbook_service::get_visible_entry(&state.db, entry_id)
        .await?
        .ok_or(AppError::NotFound("Guestbook entry"))?;

    Ok(Json(entry.into()))
}

/// Leave a message.
///
/// # Response
///
/// - **Success (201 Created)**: `{"success": true, "message": "...", "entry": {...}}`
/// - **Error (400)**: empty or oversized name/comment, malformed e-mail
///
/// The entry stays hidden until an administrator approves it.
pub async fn create_entry(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEntryRequest>,
) -> Result<(StatusCode, Json<CreateEntryResponse>), AppError> {
    let request = request.sanitized()?;

    let entry = guestbook_service::create_entry(&state.db, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse {
            success: true,
            message: "Thank you! Your message will appear once approved.".to_string(),
            entry,
        }),
    ))
}

pub async fn get_all_entries_admin(
    State(state): State<AppState>,
) -> Result<Json<AdminEntriesResponse>, AppError> {
    let entries = guestbook_service::list_all_entries(&state.db).await?;
    Ok(Json(AdminEntriesResponse {
        success: true,
        entries,
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let entry_id = parse_id(&raw_id, "guestbook entry")?;

    guestbook_service::delete_entry(&state.db, entry_id).await?;

    tracing::info!(entry_id, "guestbook entry deleted");
    Ok(Json(MessageResponse::ok("Entry deleted")))
}

pub async fn update_entry_approval(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let entry_id = parse_id(&raw_id, "guestbook entry")?;

    guestbook_service::set_approval(&state.db, entry_id, request.approved).await?;

    tracing::info!(entry_id, approved = request.approved, "guestbook entry moderated");
    let message = if request.approved {
        "Entry approved"
    } else {
        "Entry hidden"
    };
    Ok(Json(MessageResponse::ok(message)))
}
