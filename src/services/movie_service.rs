//! Movie repository - read access to the movie catalogue.
//!
//! All queries run against the primary database. List queries return bare
//! movies; `get_movie_by_id` also loads genres, cast and keywords.

use crate::{
    db::DbPool,
    error::AppError,
    models::movie::{Actor, Genre, Movie, SortOrder},
};

const MOVIE_COLUMNS: &str = "id, tmdb_id, title, tagline, release_year, overview, score, popularity, language, poster_url, trailer_url";

/// Default page size for home-page rows.
pub const DEFAULT_LIMIT: i64 = 10;
/// Cap for search and filter results.
pub const MAX_LIMIT: i64 = 50;

pub async fn get_top_movies(pool: &DbPool) -> Result<Vec<Movie>, AppError> {
    let movies = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY popularity DESC NULLS LAST, id LIMIT $1"
    ))
    .bind(DEFAULT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

pub async fn get_random_movies(pool: &DbPool) -> Result<Vec<Movie>, AppError> {
    let movies = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY random() LIMIT $1"
    ))
    .bind(DEFAULT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Movies whose original audio is `language` (ISO 639-1). `None` lists every language.
pub async fn get_movies_by_language(
    pool: &DbPool,
    language: Option<&str>,
) -> Result<Vec<Movie>, AppError> {
    let movies = sqlx::query_as::<_, Movie>(&format!(
        r#"
        SELECT {MOVIE_COLUMNS} FROM movies
        WHERE ($1::TEXT IS NULL OR LOWER(language) = LOWER($1))
        ORDER BY popularity DESC NULLS LAST, id
        LIMIT $2
        "#
    ))
    .bind(language)
    .bind(MAX_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Case-insensitive title search with optional genre filter.
pub async fn search_movies(
    pool: &DbPool,
    query: &str,
    order: SortOrder,
    genre_id: Option<i32>,
) -> Result<Vec<Movie>, AppError> {
    let pattern = format!("%{}%", escape_like(query));

    // order.movie_sql() only yields constant fragments
    let movies = sqlx::query_as::<_, Movie>(&format!(
        r#"
        SELECT {MOVIE_COLUMNS} FROM movies
        WHERE title ILIKE $1
          AND ($2::INTEGER IS NULL OR EXISTS (
                SELECT 1 FROM movie_genres mg
                WHERE mg.movie_id = movies.id AND mg.genre_id = $2))
        ORDER BY {}
        LIMIT $3
        "#,
        order.movie_sql()
    ))
    .bind(pattern)
    .bind(genre_id)
    .bind(MAX_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

/// Fetch a movie together with its genres, cast and keywords.
pub async fn get_movie_by_id(pool: &DbPool, movie_id: i32) -> Result<Option<Movie>, AppError> {
    let Some(mut movie) = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
    ))
    .bind(movie_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    movie.genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.id, g.name FROM genres g
        JOIN movie_genres mg ON mg.genre_id = g.id
        WHERE mg.movie_id = $1
        ORDER BY g.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    movie.casting = sqlx::query_as::<_, Actor>(
        r#"
        SELECT a.id, a.first_name, a.last_name, a.image_url FROM actors a
        JOIN movie_cast mc ON mc.actor_id = a.id
        WHERE mc.movie_id = $1
        ORDER BY a.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    movie.keywords = sqlx::query_scalar::<_, String>(
        r#"
        SELECT k.word FROM keywords k
        JOIN movie_keywords mk ON mk.keyword_id = k.id
        WHERE mk.movie_id = $1
        ORDER BY k.word
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(movie))
}

pub async fn get_all_genres(pool: &DbPool) -> Result<Vec<Genre>, AppError> {
    let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}

pub async fn movie_exists(pool: &DbPool, movie_id: i32) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
        .bind(movie_id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("Mad Max"), "Mad Max");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\dir"), "c:\\\\dir");
    }
}
