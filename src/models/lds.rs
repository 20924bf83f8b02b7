//! LDS content catalogue models.
//!
//! The LDS catalogue lives in its own database. Items are talks, music,
//! scripture readings and family videos, most of them hosted on YouTube.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::movie::Genre;

/// Represents a row of the `lds_content` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LdsContent {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,

    /// Kind of media: "talk", "music", "scripture", "video", ...
    pub content_type: String,

    pub religion: Option<String>,
    pub category: Option<String>,
    pub denomination: Option<String>,
    pub speaker: Option<String>,
    pub conference_session: Option<String>,
    pub scripture_reference: Option<String>,

    /// 11-character YouTube video id
    pub youtube_id: Option<String>,
    pub youtube_url: Option<String>,
    pub thumbnail_url: Option<String>,

    pub content_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub views: i64,
    pub likes: i64,

    /// Editorial rating on a 0-10 scale
    pub spiritual_rating: Option<f32>,
    pub popularity: Option<f32>,
    pub language: Option<String>,

    #[sqlx(skip)]
    pub genres: Vec<Genre>,
}

/// Fixed category listings exposed under `/api/LDS/<category>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdsCategory {
    Music,
    Scripture,
    Family,
    BibleVideos,
    ChristianSongs,
}

impl LdsCategory {
    /// SQL predicate selecting the category. Constant text only.
    pub fn filter_sql(self) -> &'static str {
        match self {
            LdsCategory::Music => "content_type = 'music'",
            LdsCategory::Scripture => "(content_type = 'scripture' OR scripture_reference IS NOT NULL)",
            LdsCategory::Family => "category = 'family'",
            LdsCategory::BibleVideos => "category = 'bible_video'",
            LdsCategory::ChristianSongs => "category = 'christian_song'",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LdsCategory::Music => "music",
            LdsCategory::Scripture => "scripture",
            LdsCategory::Family => "family",
            LdsCategory::BibleVideos => "bible-videos",
            LdsCategory::ChristianSongs => "christian-songs",
        }
    }
}

/// Response of `GET /api/LDS/collection-status`.
#[derive(Debug, Serialize)]
pub struct CollectionStatus {
    pub lds_id: i32,
    pub favorite: bool,
    pub watchlist: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filters_are_distinct() {
        let all = [
            LdsCategory::Music,
            LdsCategory::Scripture,
            LdsCategory::Family,
            LdsCategory::BibleVideos,
            LdsCategory::ChristianSongs,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.filter_sql(), b.filter_sql());
                assert_ne!(a.label(), b.label());
            }
        }
    }

    #[test]
    fn test_scripture_includes_referenced_content() {
        assert!(LdsCategory::Scripture.filter_sql().contains("scripture_reference"));
    }
}
