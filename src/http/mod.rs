use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

mod error;
mod extract;
pub mod flash;
mod handlers;
mod routes;
pub mod views;

pub use error::AppError;

/// Form posts are small; anything larger is rejected before a handler runs.
const MAX_FORM_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::board())
        .merge(routes::fms())
        .fallback(handlers::not_found)
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .with_state(state)
}
