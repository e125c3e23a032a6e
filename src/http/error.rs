use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::http::views::ErrorTemplate;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let page = ErrorTemplate {
            flashes: Vec::new(),
            status: self.status.as_u16(),
            message: &self.message,
        };
        let body = match page.render() {
            Ok(html) => html,
            Err(err) => {
                tracing::error!(error = ?err, "failed to render error page");
                self.message.clone()
            }
        };
        (self.status, Html(body)).into_response()
    }
}
