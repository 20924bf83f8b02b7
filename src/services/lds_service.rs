//! LDS repository - read access to the LDS content database.
//!
//! Mirrors the movie repository over `lds_content`. Every function takes the
//! LDS pool, never the primary one.

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        lds::{LdsCategory, LdsContent},
        movie::{Genre, SortOrder},
    },
    services::movie_service::{DEFAULT_LIMIT, MAX_LIMIT, escape_like},
};

const LDS_COLUMNS: &str = "id, title, description, content_type, religion, category, denomination, speaker, conference_session, scripture_reference, youtube_id, youtube_url, thumbnail_url, content_date, duration_minutes, views, likes, spiritual_rating, popularity, language";

pub async fn get_top_lds(pool: &DbPool) -> Result<Vec<LdsContent>, AppError> {
    let items = sqlx::query_as::<_, LdsContent>(&format!(
        "SELECT {LDS_COLUMNS} FROM lds_content ORDER BY popularity DESC NULLS LAST, id LIMIT $1"
    ))
    .bind(DEFAULT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn get_random_lds(pool: &DbPool) -> Result<Vec<LdsContent>, AppError> {
    let items = sqlx::query_as::<_, LdsContent>(&format!(
        "SELECT {LDS_COLUMNS} FROM lds_content ORDER BY random() LIMIT $1"
    ))
    .bind(DEFAULT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Search title and description, optionally restricted to one LDS genre.
pub async fn search_lds(
    pool: &DbPool,
    query: &str,
    order: SortOrder,
    genre_id: Option<i32>,
) -> Result<Vec<LdsContent>, AppError> {
    let pattern = format!("%{}%", escape_like(query));

    let items = sqlx::query_as::<_, LdsContent>(&format!(
        r#"
        SELECT {LDS_COLUMNS} FROM lds_content
        WHERE (title ILIKE $1 OR description ILIKE $1)
          AND ($2::INTEGER IS NULL OR EXISTS (
                SELECT 1 FROM lds_content_genres cg
                WHERE cg.lds_id = lds_content.id AND cg.genre_id = $2))
        ORDER BY {}
        LIMIT $3
        "#,
        order.lds_sql()
    ))
    .bind(pattern)
    .bind(genre_id)
    .bind(MAX_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn get_lds_by_id(pool: &DbPool, lds_id: i32) -> Result<Option<LdsContent>, AppError> {
    let Some(mut item) = sqlx::query_as::<_, LdsContent>(&format!(
        "SELECT {LDS_COLUMNS} FROM lds_content WHERE id = $1"
    ))
    .bind(lds_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    item.genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.id, g.name FROM lds_genres g
        JOIN lds_content_genres cg ON cg.genre_id = g.id
        WHERE cg.lds_id = $1
        ORDER BY g.name
        "#,
    )
    .bind(lds_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(item))
}

pub async fn get_lds_genres(pool: &DbPool) -> Result<Vec<Genre>, AppError> {
    let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM lds_genres ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}

pub async fn get_lds_by_category(
    pool: &DbPool,
    category: LdsCategory,
) -> Result<Vec<LdsContent>, AppError> {
    let items = sqlx::query_as::<_, LdsContent>(&format!(
        r#"
        SELECT {LDS_COLUMNS} FROM lds_content
        WHERE {}
        ORDER BY popularity DESC NULLS LAST, id
        LIMIT $1
        "#,
        category.filter_sql()
    ))
    .bind(MAX_LIMIT)
    .fetch_all(pool)
    .await?;

    tracing::debug!(target: "lds", category = category.label(), count = items.len(), "category listing");
    Ok(items)
}

/// Load several items, keeping the order of `ids`. Unknown ids are skipped.
///
/// Used to resolve a user's LDS collections, whose ids are stored in the primary database.
pub async fn get_lds_by_ids(pool: &DbPool, ids: &[i32]) -> Result<Vec<LdsContent>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let items = sqlx::query_as::<_, LdsContent>(&format!(
        "SELECT {LDS_COLUMNS} FROM lds_content WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(order_by_ids(items, ids))
}

pub async fn lds_exists(pool: &DbPool, lds_id: i32) -> Result<bool, AppError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM lds_content WHERE id = $1)")
            .bind(lds_id)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

fn order_by_ids(mut items: Vec<LdsContent>, ids: &[i32]) -> Vec<LdsContent> {
    items.sort_by_key(|item| ids.iter().position(|id| *id == item.id).unwrap_or(usize::MAX));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i32) -> LdsContent {
        LdsContent {
            id,
            title: format!("Talk {id}"),
            description: None,
            content_type: "talk".into(),
            religion: None,
            category: None,
            denomination: None,
            speaker: None,
            conference_session: None,
            scripture_reference: None,
            youtube_id: None,
            youtube_url: None,
            thumbnail_url: None,
            content_date: None,
            duration_minutes: None,
            views: 0,
            likes: 0,
            spiritual_rating: None,
            popularity: None,
            language: None,
            genres: Vec::new(),
        }
    }

    #[test]
    fn test_order_by_ids_follows_collection_order() {
        let ordered = order_by_ids(vec![item(1), item(2), item(3)], &[3, 1, 2]);
        let ids: Vec<i32> = ordered.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
