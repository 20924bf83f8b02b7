//! PhoenixFlix - Main Application Entry Point
//!
//! HTTP server for the PhoenixFlix movie catalogue and its LDS content vertical:
//! catalogue browsing and search, user accounts with favourites and watchlists,
//! passkey login, a moderated guestbook and server-rendered movie pages.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: two PostgreSQL databases with sqlx (primary and LDS)
//! - **Authentication**: JWT sessions, Argon2 passwords, WebAuthn passkeys
//! - **Format**: JSON API plus static files from `PUBLIC_DIR`
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create both database connection pools
//! 3. Run migrations on both databases
//! 4. Build HTTP router with routes and middleware
//! 5. Serve until Ctrl+C or SIGTERM

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG; `RUST_LOG=movies=debug,lds=debug` narrows to one vertical
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    let lds_pool = db::create_pool(&config.database_url_lds, config.db_max_connections).await?;
    tracing::info!("Database pools created");

    db::run_migrations(&pool).await?;
    db::run_lds_migrations(&lds_pool).await?;
    tracing::info!("Database migrations complete");

    let addr = format!("0.0.0.0:{}", config.server_port);
    let state = state::AppState::new(config, pool, lds_pool)?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
