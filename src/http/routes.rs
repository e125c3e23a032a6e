use axum::{routing::get, routing::post, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn board() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_posts))
        .route(
            "/create/",
            get(handlers::create_form).post(handlers::create_post),
        )
        .route("/post/:id", get(handlers::view_post))
        .route(
            "/edit/:id",
            get(handlers::edit_form).post(handlers::edit_post),
        )
        .route("/delete/batch", post(handlers::delete_batch))
        .route("/delete/:id", post(handlers::delete_post))
        .route("/post/comment/:id", post(handlers::comment_post))
        .route("/post/like/:id", post(handlers::like_post))
}

pub fn fms() -> Router<AppState> {
    Router::new().route("/fms", get(handlers::fms_dashboard))
}
