use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::http::AppError;

/// Numeric post id taken from the last path segment.
///
/// A segment that is not an integer is answered with the HTML error page
/// instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct PostId(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(PostId(id))
    }
}
