//! Contest subscription: entering a project into a contest.

use atelier_core::models::{Actor, Capability, ContentItem, ContentType};
use atelier_core::{AppError, GENERIC_FAILURE_MESSAGE, NOT_AUTHORIZED_MESSAGE};
use atelier_db::Repositories;
use atelier_infra::AntiForgery;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anti-forgery action name; tokens are scoped to the contest id
pub const SUBSCRIBE_ACTION: &str = "subscribe_project";

pub const ALREADY_ENTERED: &str = "This project is already entered in this contest.";
pub const ENTERED: &str = "Your project has been entered into the contest.";

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub project_id: Uuid,
    pub parent_id: Uuid,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionOutcome {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeResult {
    pub result: SubscriptionOutcome,
    pub message: String,
    pub href: String,
}

#[derive(Clone)]
pub struct SubscriptionService {
    repos: Repositories,
    tokens: AntiForgery,
    public_base_url: String,
}

impl SubscriptionService {
    pub fn new(repos: Repositories, tokens: AntiForgery, public_base_url: impl Into<String>) -> Self {
        Self {
            repos,
            tokens,
            public_base_url: public_base_url.into(),
        }
    }

    /// Enter `project_id` into contest `parent_id`. Always answers with a result body.
    #[tracing::instrument(
        skip(self, actor, request),
        fields(actor_id = %actor.id, project_id = %request.project_id, parent_id = %request.parent_id)
    )]
    pub async fn subscribe(&self, actor: &Actor, request: &SubscribeRequest) -> SubscribeResult {
        let href = self.contest_href(request.parent_id);

        match self.try_subscribe(actor, request).await {
            Ok(message) => SubscribeResult {
                result: SubscriptionOutcome::Success,
                message: message.to_string(),
                href,
            },
            Err(e) => {
                match &e {
                    AppError::Forbidden(reason) => {
                        tracing::debug!(reason = %reason, "Subscription refused")
                    }
                    AppError::InvalidInput(reason) => {
                        tracing::debug!(reason = %reason, "Subscription rejected")
                    }
                    other => tracing::error!(error = %other, "Subscription failed"),
                }
                let message = match e {
                    AppError::Forbidden(_) => NOT_AUTHORIZED_MESSAGE.to_string(),
                    AppError::InvalidInput(message) => message,
                    _ => GENERIC_FAILURE_MESSAGE.to_string(),
                };
                SubscribeResult {
                    result: SubscriptionOutcome::Error,
                    message,
                    href,
                }
            }
        }
    }

    async fn try_subscribe(
        &self,
        actor: &Actor,
        request: &SubscribeRequest,
    ) -> Result<&'static str, AppError> {
        self.tokens
            .verify(
                &request.token,
                SUBSCRIBE_ACTION,
                &request.parent_id.to_string(),
                actor.id,
            )
            .map_err(|e| AppError::Forbidden(e.to_string()))?;

        let project = self
            .load(request.project_id, ContentType::Project)
            .await?;
        if project.author_id != actor.id && !actor.can(Capability::EditOthers) {
            return Err(AppError::Forbidden(format!(
                "actor does not own project {}",
                project.id
            )));
        }

        let contest = self.load(request.parent_id, ContentType::Contest).await?;
        if !contest.status.is_public() {
            return Err(AppError::Forbidden(format!(
                "contest {} is not published",
                contest.id
            )));
        }

        let associations = &self.repos.associations;
        if associations.exists(project.id, contest.id).await? {
            return Err(AppError::InvalidInput(ALREADY_ENTERED.to_string()));
        }
        associations.insert(project.id, contest.id).await?;

        tracing::info!("Project entered into contest");
        Ok(ENTERED)
    }

    /// Unknown ids and type mismatches are reported as authorization failures
    async fn load(&self, id: Uuid, expected: ContentType) -> Result<ContentItem, AppError> {
        match self.repos.content.get(id).await? {
            Some(item) if item.content_type == expected => Ok(item),
            Some(item) => Err(AppError::Forbidden(format!(
                "{} is a {}, expected {}",
                id, item.content_type, expected
            ))),
            None => Err(AppError::Forbidden(format!("{} not found", id))),
        }
    }

    fn contest_href(&self, parent_id: Uuid) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            ContentType::Contest.slug(),
            parent_id
        )
    }
}
