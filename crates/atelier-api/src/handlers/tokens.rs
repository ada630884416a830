//! Anti-forgery token issuance.

use atelier_core::models::ContentType;
use atelier_core::AppError;
use atelier_infra::NEW_SCOPE;
use atelier_services::{submit_action, SUBSCRIBE_ACTION};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CurrentActor;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    action: String,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub action: String,
    pub scope: String,
    pub expires_in: u64,
}

fn known_action(action: &str) -> bool {
    action == SUBSCRIBE_ACTION
        || action == submit_action(ContentType::Project)
        || action == submit_action(ContentType::Contest)
}

/// `"new"`, or the canonical form of an entity id
fn normalize_scope(scope: Option<&str>) -> Result<String, AppError> {
    match scope.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(NEW_SCOPE.to_string()),
        Some(NEW_SCOPE) => Ok(NEW_SCOPE.to_string()),
        Some(raw) => Uuid::parse_str(raw)
            .map(|id| id.to_string())
            .map_err(|_| AppError::InvalidInput(format!("Invalid token scope: {}", raw))),
    }
}

pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, HttpAppError> {
    if !known_action(&query.action) {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Unknown action: {}",
            query.action
        ))));
    }
    let scope = normalize_scope(query.scope.as_deref())?;

    let token = state
        .tokens
        .issue(&query.action, &scope, actor.id)
        .map_err(|e| AppError::Internal(format!("Failed to issue token: {}", e)))?;

    Ok(Json(TokenResponse {
        token,
        action: query.action,
        scope,
        expires_in: state.config.csrf_token_ttl_secs,
    }))
}
