//! Movie catalogue HTTP handlers.
//!
//! This module implements the public movie endpoints:
//! - GET /api/movies/top - Most popular movies
//! - GET /api/movies/random - Random selection
//! - GET /api/movies/language/{language} - Movies by original language
//! - GET /api/movies/search?q=&order=&genre= - Title search
//! - GET /api/movies/{id} - Movie details
//! - GET /api/genres - All genres

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    handlers::{extract::ApiQuery, parse_id},
    models::movie::{Genre, Movie, SearchParams},
    services::movie_service,
    state::AppState,
};

pub async fn get_top_movies(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = movie_service::get_top_movies(&state.db).await?;
    Ok(Json(movies))
}

pub async fn get_random_movies(
    State(state): State<AppState>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let movies = movie_service::get_random_movies(&state.db).await?;
    Ok(Json(movies))
}

/// Movies by original audio language.
///
/// # Endpoint
///
/// `GET /api/movies/language/{language}`, e.g. `/api/movies/language/ja`.
/// The pseudo-language `all` disables the filter.
pub async fn get_movies_by_language(
    State(state): State<AppState>,
    Path(language): Path<String>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let language = normalize_language(&language)?;
    let movies = movie_service::get_movies_by_language(&state.db, language.as_deref()).await?;
    Ok(Json(movies))
}

/// Search movies by title.
///
/// # Endpoint
///
/// `GET /api/movies/search?q=Mad Max&order=score&genre=12`
///
/// # Query Parameters
///
/// - `q` (required): case-insensitive substring of the title
/// - `order`: `score`, `name`, `date`; anything else sorts by popularity
/// - `genre`: genre id filter
pub async fn search_movies(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let query = params
        .query()
        .ok_or_else(|| AppError::InvalidRequest("Search query is required".to_string()))?;

    let movies =
        movie_service::search_movies(&state.db, query, params.sort_order(), params.genre_id())
            .await?;

    Ok(Json(movies))
}

/// Get one movie with genres, cast and keywords.
///
/// # Response
///
/// - **Success (200 OK)**: the movie
/// - **Error (400)**: non-numeric id
/// - **Error (404)**: unknown id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Movie>, AppError> {
    let movie_id = parse_id(&raw_id, "movie")?;

    let movie = movie_service::get_movie_by_id(&state.db, movie_id)
        .await?
        .ok_or(AppError::NotFound("Movie"))?;

    Ok(Json(movie))
}

pub async fn get_genres(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, AppError> {
    let genres = movie_service::get_all_genres(&state.db).await?;
    Ok(Json(genres))
}

/// `all` → no filter; otherwise a 2-3 letter ISO 639 code, lowercased.
fn normalize_language(raw: &str) -> Result<Option<String>, AppError> {
    let language = raw.trim().to_ascii_lowercase();
    if language.is_empty() || language == "all" {
        return Ok(None);
    }
    if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(AppError::InvalidRequest(format!(
            "Unsupported language code: {raw}"
        )));
    }
    Ok(Some(language))
}

#[cfg(test)]
mod tests {
    use super::normalize_language;

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("ja").unwrap().as_deref(), Some("ja"));
        assert_eq!(normalize_language(" EN ").unwrap().as_deref(), Some("en"));
        assert_eq!(normalize_language("all").unwrap(), None);
        assert!(normalize_language("english").is_err());
        assert!(normalize_language("e1").is_err());
    }
}
