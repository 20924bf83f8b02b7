//! HTTP router: public catalogue, protected account routes, admin routes and pages.

use std::time::Duration;

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{accounts, guestbook, health, lds, movies, pages, passkeys},
    middleware::auth::{admin_middleware, auth_middleware},
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        // Movies
        .route("/api/movies/top", get(movies::get_top_movies))
        .route("/api/movies/random", get(movies::get_random_movies))
        .route("/api/movies/search", get(movies::search_movies))
        .route("/api/movies/search/", get(movies::search_movies))
        .route(
            "/api/movies/language/{language}",
            get(movies::get_movies_by_language),
        )
        .route("/api/movies/{id}", get(movies::get_movie))
        .route("/api/genres", get(movies::get_genres))
        // LDS catalogue
        .route("/api/LDS/top", get(lds::get_top_lds))
        .route("/api/LDS/random", get(lds::get_random_lds))
        .route("/api/LDS/search", get(lds::search_lds))
        .route("/api/LDS/genres", get(lds::get_genres))
        .route("/api/LDS/music", get(lds::get_lds_music))
        .route("/api/LDS/scripture", get(lds::get_lds_scripture))
        .route("/api/LDS/family", get(lds::get_lds_family))
        .route("/api/LDS/bible-videos", get(lds::get_bible_videos))
        .route("/api/LDS/christian-songs", get(lds::get_christian_songs))
        .route("/api/LDS/{id}", get(lds::get_lds))
        // Accounts
        .route("/api/account/register", post(accounts::register))
        .route("/api/account/authenticate", post(accounts::authenticate))
        .route("/api/account/confirm", get(accounts::confirm_email))
        .route(
            "/api/account/forgot-password",
            post(accounts::forgot_password),
        )
        .route("/api/account/reset-password", post(accounts::reset_password))
        // Passkey login
        .route(
            "/api/passkey/authentication-begin",
            post(passkeys::authentication_begin),
        )
        .route(
            "/api/passkey/authentication-end",
            post(passkeys::authentication_end),
        )
        // Guestbook
        .route("/api/guestbook", get(guestbook::get_all_entries))
        .route("/api/guestbook/create", post(guestbook::create_entry))
        .route("/api/guestbook/{id}", get(guestbook::get_entry_by_id));

    let authenticated_api = Router::new()
        .route("/api/account/details", get(accounts::get_account_details))
        .route("/api/account/favorites", get(accounts::get_favorites))
        .route("/api/account/watchlist", get(accounts::get_watchlist))
        .route(
            "/api/account/save-movie-to-collection",
            post(accounts::save_movie_to_collection),
        )
        .route(
            "/api/account/save-to-collection",
            post(accounts::save_movie_to_collection),
        )
        .route(
            "/api/account/remove-movie-from-collection",
            post(accounts::remove_movie_from_collection),
        )
        .route(
            "/api/account/save-lds-to-collection",
            post(lds::save_lds_to_collection),
        )
        .route(
            "/api/account/resend-verification",
            post(accounts::resend_verification),
        )
        .route("/api/LDS/favorites", get(lds::get_lds_favorites))
        .route("/api/LDS/watchlist", get(lds::get_lds_watchlist))
        .route("/api/LDS/save-to-collection", post(lds::save_lds_to_collection))
        .route(
            "/api/LDS/remove-from-collection",
            post(lds::remove_lds_from_collection),
        )
        .route("/api/LDS/collection-status", get(lds::get_collection_status))
        .route(
            "/api/passkey/registration-begin",
            post(passkeys::registration_begin),
        )
        .route(
            "/api/passkey/registration-end",
            post(passkeys::registration_end),
        )
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    // Layers run bottom-up: authentication first, then the admin check.
    let admin_api = Router::new()
        .route("/api/admin/guestbook", get(guestbook::get_all_entries_admin))
        .route(
            "/api/admin/guestbook/delete/{id}",
            delete(guestbook::delete_entry),
        )
        .route(
            "/api/admin/guestbook/approve/{id}",
            put(guestbook::update_entry_approval),
        )
        .route_layer(from_fn(admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let pages = Router::new()
        .route("/health", get(health::health_check))
        .route("/movies/{id}", get(pages::movie_details_page))
        .route("/movies", get(pages::spa_index))
        .route("/account", get(pages::spa_index))
        .route("/account/{*rest}", get(pages::spa_index))
        .route("/lds", get(pages::spa_index))
        .route("/lds/{*rest}", get(pages::spa_index))
        .route("/guestbook", get(pages::spa_index))
        .route("/admin/guestbook", get(pages::spa_index));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let static_files = pages::static_files(&state.config.public_dir);

    Router::new()
        .merge(public_api)
        .merge(authenticated_api)
        .merge(admin_api)
        .merge(pages)
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::router;
    use crate::state::test_state;

    async fn post_json(uri: &str, body: &'static str) -> Response {
        router(test_state())
            .oneshot(
                Request::post(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn error_code(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        body["error"]["code"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for uri in [
            "/api/account/details",
            "/api/account/favorites",
            "/api/LDS/watchlist",
            "/api/admin/guestbook",
        ] {
            let response = router(test_state())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(error_code(response).await, "unauthorized");
        }
    }

    #[tokio::test]
    async fn test_forged_token_is_rejected() {
        let response = router(test_state())
            .oneshot(
                Request::get("/api/account/favorites")
                    .header("Authorization", "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_numeric_movie_id_is_bad_request() {
        let response = router(test_state())
            .oneshot(Request::get("/api/movies/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "invalid_request");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        for uri in ["/api/movies/search", "/api/movies/search/?q=%20", "/api/LDS/search"] {
            let response = router(test_state())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_guestbook_create_validates_before_storing() {
        let response = router(test_state())
            .oneshot(
                Request::post("/api/guestbook/create")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"name":"  ","comment":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_validates_before_storing() {
        let response = router(test_state())
            .oneshot(
                Request::post("/api/account/register")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{"name":"Ben","email":"ben@example.com","password":"short"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        for (uri, body) in [
            ("/api/account/register", "{}"),
            ("/api/account/authenticate", r#"{"email":"ben@example.com"}"#),
            ("/api/guestbook/create", r#"{"name":"Ben","comment":"hi","message_type":"Public"}"#),
            ("/api/passkey/authentication-end", "{}"),
            ("/api/account/forgot-password", "not json"),
        ] {
            let response = post_json(uri, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(
                response.headers()["content-type"],
                "application/json",
                "{uri}"
            );
            assert_eq!(error_code(response).await, "invalid_request", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_missing_query_parameter_gets_json_error() {
        let response = router(test_state())
            .oneshot(Request::get("/api/account/confirm").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "invalid_request");
    }
}
