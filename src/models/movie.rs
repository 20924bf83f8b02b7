//! Movie catalogue models.
//!
//! This module defines:
//! - `Movie`: catalogue entry, optionally enriched with genres, cast and keywords
//! - `Genre`, `Actor`: related records
//! - `SearchParams` / `SortOrder`: query-string handling shared with the LDS catalogue

use serde::{Deserialize, Serialize};

/// Represents a movie record from the `movies` table.
///
/// `genres`, `casting` and `keywords` are not columns; they are filled in
/// by the detail query and left empty for list queries.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Movie {
    pub id: i32,

    /// Identifier in The Movie Database, when the row was imported from it
    pub tmdb_id: Option<i32>,

    pub title: String,

    pub tagline: Option<String>,

    pub release_year: i32,

    pub overview: Option<String>,

    /// Average user score on a 0-10 scale
    pub score: Option<f32>,

    pub popularity: Option<f32>,

    /// ISO 639-1 code of the original audio (e.g. "en", "ja")
    pub language: Option<String>,

    pub poster_url: Option<String>,

    pub trailer_url: Option<String>,

    #[sqlx(skip)]
    pub genres: Vec<Genre>,

    #[sqlx(skip)]
    pub casting: Vec<Actor>,

    #[sqlx(skip)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Actor {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub image_url: Option<String>,
}

/// Query string accepted by the search endpoints.
///
/// ```text
/// /api/movies/search?q=Mad Max&order=score&genre=12
/// ```
///
/// `genre` is kept as text because browsers happily send `genre=` or
/// `genre=undefined`; anything that is not an integer means "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub order: Option<String>,
    pub genre: Option<String>,
}

impl SearchParams {
    /// Trimmed, non-empty search text.
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn genre_id(&self) -> Option<i32> {
        self.genre.as_deref().and_then(|g| g.trim().parse().ok())
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse(self.order.as_deref())
    }
}

/// Result ordering for catalogue searches.
///
/// Each variant maps to a fixed SQL fragment; user input never reaches the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Popularity,
    Score,
    Name,
    Date,
}

impl SortOrder {
    pub fn parse(order: Option<&str>) -> Self {
        match order.map(|o| o.trim().to_ascii_lowercase()).as_deref() {
            Some("score") => SortOrder::Score,
            Some("name") => SortOrder::Name,
            Some("date") => SortOrder::Date,
            _ => SortOrder::Popularity,
        }
    }

    pub fn movie_sql(self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity DESC NULLS LAST, id",
            SortOrder::Score => "score DESC NULLS LAST, id",
            SortOrder::Name => "title ASC, id",
            SortOrder::Date => "release_year DESC, id",
        }
    }

    pub fn lds_sql(self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity DESC NULLS LAST, id",
            SortOrder::Score => "spiritual_rating DESC NULLS LAST, id",
            SortOrder::Name => "title ASC, id",
            SortOrder::Date => "content_date DESC NULLS LAST, id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::parse(Some("score")), SortOrder::Score);
        assert_eq!(SortOrder::parse(Some(" NAME ")), SortOrder::Name);
        assert_eq!(SortOrder::parse(Some("date")), SortOrder::Date);
        assert_eq!(SortOrder::parse(Some("drop table")), SortOrder::Popularity);
        assert_eq!(SortOrder::parse(None), SortOrder::Popularity);
    }

    #[test]
    fn test_lds_ordering_uses_lds_columns() {
        assert!(SortOrder::Score.lds_sql().starts_with("spiritual_rating"));
        assert!(SortOrder::Date.lds_sql().starts_with("content_date"));
        assert!(SortOrder::Date.movie_sql().starts_with("release_year"));
    }

    #[test]
    fn test_search_params_tolerate_browser_noise() {
        let params = SearchParams {
            q: Some("  Mad Max ".into()),
            order: None,
            genre: Some("undefined".into()),
        };
        assert_eq!(params.query(), Some("Mad Max"));
        assert_eq!(params.genre_id(), None);

        let params = SearchParams {
            q: Some("   ".into()),
            order: Some("score".into()),
            genre: Some("12".into()),
        };
        assert_eq!(params.query(), None);
        assert_eq!(params.genre_id(), Some(12));
        assert_eq!(params.sort_order(), SortOrder::Score);
    }
}
