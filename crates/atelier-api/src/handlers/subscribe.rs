use atelier_services::{SubscribeRequest, SubscribeResult};
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::CurrentActor;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Enter a project into a contest; the outcome is carried in the body
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    ValidatedJson(request): ValidatedJson<SubscribeRequest>,
) -> Result<Json<SubscribeResult>, HttpAppError> {
    Ok(Json(state.subscriptions.subscribe(&actor, &request).await))
}
