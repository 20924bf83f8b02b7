//! HTML pages.
//!
//! `/movies/{id}` is rendered on the server so that crawlers and link
//! previews see real content. Every other page belongs to the single-page
//! app and is answered with `index.html`.

use std::path::Path as FsPath;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::{
    error::AppError,
    handlers::parse_id,
    models::movie::Movie,
    services::movie_service,
    state::AppState,
};

/// Escape text for use in HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Static files from `PUBLIC_DIR`; unknown paths get `index.html` so that
/// client-side routes survive a reload.
pub fn static_files(public_dir: &str) -> ServeDir<ServeFile> {
    let index = FsPath::new(public_dir).join("index.html");
    ServeDir::new(public_dir).fallback(ServeFile::new(index))
}

/// The SPA shell for client-side routes such as `/account/login`.
pub async fn spa_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    load_index(&state).await.map(Html)
}

/// Server-rendered movie detail page.
///
/// A malformed or unknown id is handed to the SPA, which shows its own
/// not-found view.
pub async fn movie_details_page(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let Ok(movie_id) = parse_id(&raw_id, "movie") else {
        return Ok(Html(load_index(&state).await?).into_response());
    };

    match movie_service::get_movie_by_id(&state.db, movie_id).await? {
        Some(movie) => Ok(Html(render_movie_page(&movie)).into_response()),
        None => {
            tracing::debug!(target: "movies", movie_id, "no movie for detail page, serving SPA");
            Ok(Html(load_index(&state).await?).into_response())
        }
    }
}

async fn load_index(state: &AppState) -> Result<String, AppError> {
    let path = FsPath::new(&state.config.public_dir).join("index.html");
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read {}: {e}", path.display())))
}

fn render_movie_page(movie: &Movie) -> String {
    let title = escape_html(&movie.title);
    let raw_overview = movie.overview.as_deref().unwrap_or_default();
    let overview = escape_html(raw_overview);
    let description = escape_html(&raw_overview.chars().take(160).collect::<String>());

    let mut body = String::new();
    body.push_str(&format!("<h1>{title} ({})</h1>", movie.release_year));
    if let Some(tagline) = movie.tagline.as_deref().filter(|t| !t.is_empty()) {
        body.push_str(&format!("<h3>{}</h3>", escape_html(tagline)));
    }
    if let Some(poster) = &movie.poster_url {
        body.push_str(&format!(
            "<img src=\"{}\" alt=\"{title} poster\">",
            escape_html(poster)
        ));
    }
    if !overview.is_empty() {
        body.push_str(&format!("<p>{overview}</p>"));
    }
    if let Some(score) = movie.score {
        body.push_str(&format!("<p>Score: {score:.1} / 10</p>"));
    }
    if !movie.genres.is_empty() {
        body.push_str("<ul class=\"genres\">");
        for genre in &movie.genres {
            body.push_str(&format!("<li>{}</li>", escape_html(&genre.name)));
        }
        body.push_str("</ul>");
    }
    if !movie.casting.is_empty() {
        body.push_str("<h2>Cast</h2><ul class=\"cast\">");
        for actor in &movie.casting {
            body.push_str(&format!(
                "<li>{} {}</li>",
                escape_html(&actor.first_name),
                escape_html(&actor.last_name)
            ));
        }
        body.push_str("</ul>");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - PhoenixFlix</title>
    <meta name="description" content="{description}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:type" content="video.movie">
    <script src="/app.js" type="module"></script>
</head>
<body>
    <main><article class="movie-details">{body}</article></main>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::movie::{Actor, Genre};

    fn movie() -> Movie {
        Movie {
            id: 7,
            tmdb_id: None,
            title: "Tom & Jerry <Live>".into(),
            tagline: Some("Cat vs \"mouse\"".into()),
            release_year: 2021,
            overview: Some("A chase.".into()),
            score: Some(6.4),
            popularity: None,
            language: Some("en".into()),
            poster_url: Some("https://img.example/p.jpg".into()),
            trailer_url: None,
            genres: vec![Genre {
                id: 1,
                name: "Comedy".into(),
            }],
            casting: vec![Actor {
                id: 3,
                first_name: "Chloë".into(),
                last_name: "Moretz".into(),
                image_url: None,
            }],
            keywords: vec![],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_movie_page_escapes_content() {
        let html = render_movie_page(&movie());
        assert!(html.contains("<title>Tom &amp; Jerry &lt;Live&gt; - PhoenixFlix</title>"));
        assert!(html.contains("<h1>Tom &amp; Jerry &lt;Live&gt; (2021)</h1>"));
        assert!(html.contains("<h3>Cat vs &quot;mouse&quot;</h3>"));
        assert!(html.contains(r#"<img src="https://img.example/p.jpg" alt="Tom &amp; Jerry &lt;Live&gt; poster">"#));
        assert!(html.contains("<p>A chase.</p>"));
        assert!(html.contains("<li>Comedy</li>"));
        assert!(html.contains("<li>Chloë Moretz</li>"));
        assert!(html.contains("Score: 6.4 / 10"));
        assert!(!html.contains("<Live>"));
    }

    #[test]
    fn test_render_movie_page_skips_missing_fields() {
        let mut bare = movie();
        bare.tagline = None;
        bare.poster_url = None;
        bare.genres.clear();
        bare.casting.clear();
        let html = render_movie_page(&bare);
        assert!(!html.contains("<h3>"));
        assert!(!html.contains("<img"));
        assert!(!html.contains("Cast"));
    }
}
