pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::AppConfig;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Signs the flash cookie. Derived from `SESSION_SECRET`.
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(db: Db, config: &AppConfig) -> Self {
        Self {
            db,
            cookie_key: Key::from(config.session_secret.as_slice()),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
