use atelier_core::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::state::AppState;

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the bearer token into an actor and store it in the request extensions
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return HttpAppError(AppError::Unauthorized(
            "Missing or malformed Authorization header".to_string(),
        ))
        .into_response();
    };

    let actor = match state.jwt.verify(token) {
        Ok(actor) => actor,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(actor_id = %actor.id, "Request authenticated");
    request.extensions_mut().insert(actor);
    next.run(request).await
}
