//! Shared application state handed to every handler through `State`.

use std::sync::Arc;

use webauthn_rs::prelude::Webauthn;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    services::{mail_service::Mailer, passkey_service::PasskeySessions},
};

#[derive(Clone)]
pub struct AppState {
    /// Primary database: movies, users, collections, passkeys, guestbook
    pub db: DbPool,

    /// LDS content database
    pub lds_db: DbPool,

    pub config: Arc<Config>,
    pub webauthn: Arc<Webauthn>,
    pub passkey_sessions: Arc<PasskeySessions>,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, lds_db: DbPool) -> Result<Self, AppError> {
        let webauthn = crate::services::passkey_service::build_webauthn(&config)?;
        let mailer = Mailer::from_config(&config)?;

        Ok(Self {
            db,
            lds_db,
            config: Arc::new(config),
            webauthn: Arc::new(webauthn),
            passkey_sessions: Arc::new(PasskeySessions::default()),
            mailer,
        })
    }
}

/// State backed by lazy pools that never connect unless a query runs.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let config = crate::config::test_config();
    let db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let lds_db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url_lds)
        .expect("lazy pool");
    AppState::new(config, db, lds_db).expect("test state")
}
