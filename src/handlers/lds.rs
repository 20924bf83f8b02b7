//! LDS content HTTP handlers.
//!
//! Public catalogue:
//! - GET /api/LDS/top, /api/LDS/random, /api/LDS/search, /api/LDS/{id}, /api/LDS/genres
//! - GET /api/LDS/music, /scripture, /family, /bible-videos, /christian-songs
//!
//! Authenticated collections:
//! - GET /api/LDS/favorites, /api/LDS/watchlist
//! - POST /api/LDS/save-to-collection, /api/LDS/remove-from-collection
//! - GET /api/LDS/collection-status?lds_id=

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    handlers::{
        extract::{ApiJson, ApiQuery},
        parse_id,
    },
    middleware::auth::AuthContext,
    models::{
        lds::{CollectionStatus, LdsCategory, LdsContent},
        movie::{Genre, SearchParams},
        user::{Collection, LdsCollectionRequest, LdsIdQuery, MessageResponse},
    },
    services::{account_service, lds_service},
    state::AppState,
};

pub async fn get_top_lds(State(state): State<AppState>) -> Result<Json<Vec<LdsContent>>, AppError> {
    Ok(Json(lds_service::get_top_lds(&state.lds_db).await?))
}

pub async fn get_random_lds(
    State(state): State<AppState>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    Ok(Json(lds_service::get_random_lds(&state.lds_db).await?))
}

/// Search LDS content by title or description.
///
/// Same query parameters as the movie search; `order=score` sorts by spiritual rating.
pub async fn search_lds(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    let query = params
        .query()
        .ok_or_else(|| AppError::InvalidRequest("Search query is required".to_string()))?;

    let items =
        lds_service::search_lds(&state.lds_db, query, params.sort_order(), params.genre_id())
            .await?;

    Ok(Json(items))
}

pub async fn get_lds(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<LdsContent>, AppError> {
    let lds_id = parse_id(&raw_id, "LDS content")?;

    let item = lds_service::get_lds_by_id(&state.lds_db, lds_id)
        .await?
        .ok_or(AppError::NotFound("LDS content"))?;

    Ok(Json(item))
}

pub async fn get_genres(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, AppError> {
    Ok(Json(lds_service::get_lds_genres(&state.lds_db).await?))
}

async fn category(state: &AppState, category: LdsCategory) -> Result<Json<Vec<LdsContent>>, AppError> {
    Ok(Json(
        lds_service::get_lds_by_category(&state.lds_db, category).await?,
    ))
}

pub async fn get_lds_music(
    State(state): State<AppState>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    category(&state, LdsCategory::Music).await
}

pub async fn get_lds_scripture(
    State(state): State<AppState>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    category(&state, LdsCategory::Scripture).await
}

pub async fn get_lds_family(
    State(state): State<AppState>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    category(&state, LdsCategory::Family).await
}

pub async fn get_bible_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    category(&state, LdsCategory::BibleVideos).await
}

pub async fn get_christian_songs(
    State(state): State<AppState>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    category(&state, LdsCategory::ChristianSongs).await
}

/// Resolve a user's LDS collection against the LDS database.
pub(crate) async fn load_lds_collection(
    state: &AppState,
    user_id: i32,
    collection: Collection,
) -> Result<Vec<LdsContent>, AppError> {
    let ids = account_service::get_lds_collection_ids(&state.db, user_id, collection).await?;
    lds_service::get_lds_by_ids(&state.lds_db, &ids).await
}

pub async fn get_lds_favorites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    Ok(Json(
        load_lds_collection(&state, auth.user_id, Collection::Favorite).await?,
    ))
}

pub async fn get_lds_watchlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<LdsContent>>, AppError> {
    Ok(Json(
        load_lds_collection(&state, auth.user_id, Collection::Watchlist).await?,
    ))
}

/// Add LDS content to the caller's favorites or watchlist.
///
/// # Request Body
///
/// ```json
/// { "lds_id": 14, "collection": "favorite" }
/// ```
///
/// Also mounted as `POST /api/account/save-lds-to-collection`.
pub async fn save_lds_to_collection(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<LdsCollectionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let collection = Collection::parse(&request.collection)?;

    if !lds_service::lds_exists(&state.lds_db, request.lds_id).await? {
        return Err(AppError::NotFound("LDS content"));
    }

    account_service::save_lds_to_collection(&state.db, auth.user_id, request.lds_id, collection)
        .await?;

    tracing::info!(target: "lds", user_id = auth.user_id, lds_id = request.lds_id, collection = collection.as_str(), "saved to collection");
    Ok(Json(MessageResponse::ok(format!(
        "Content added to {}",
        collection.as_str()
    ))))
}

pub async fn remove_lds_from_collection(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(request): ApiJson<LdsCollectionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let collection = Collection::parse(&request.collection)?;

    let removed = account_service::remove_lds_from_collection(
        &state.db,
        auth.user_id,
        request.lds_id,
        collection,
    )
    .await?;

    let message = if removed {
        format!("Content removed from {}", collection.as_str())
    } else {
        format!("Content was not in {}", collection.as_str())
    };
    Ok(Json(MessageResponse::ok(message)))
}

pub async fn get_collection_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<LdsIdQuery>,
) -> Result<Json<CollectionStatus>, AppError> {
    let collections =
        account_service::get_lds_collections_for_item(&state.db, auth.user_id, query.lds_id)
            .await?;

    Ok(Json(CollectionStatus {
        lds_id: query.lds_id,
        favorite: collections.contains(&Collection::Favorite),
        watchlist: collections.contains(&Collection::Watchlist),
    }))
}
