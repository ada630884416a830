use atelier_core::models::Actor;
use atelier_core::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::HttpAppError;

/// Actor resolved by the auth middleware.
///
/// Extracted from request parts so it can precede `Multipart` in a handler.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(CurrentActor)
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Missing actor".to_string())))
    }
}
