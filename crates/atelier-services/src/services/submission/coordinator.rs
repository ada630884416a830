use atelier_core::models::{
    Actor, AttachmentRef, Capability, ContentItem, ContentSchema, ContentStatus, CoreFields,
    ErrorAccumulator, NewContent, COLLABORATORS_KEY, CREATION_TYPE_GROUP, CREATION_TYPE_KEY,
    GALLERY_KEY,
};
use atelier_core::validation::{is_empty_value, sanitize_field};
use atelier_core::{AppError, GENERIC_FAILURE_MESSAGE};
use atelier_db::Repositories;
use atelier_infra::{scope_for, AntiForgery};
use atelier_processing::UploadEngine;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use super::guard::CreationGuard;
use super::submit_action;
use super::types::{SubmissionError, SubmissionRequest, SubmissionSuccess};
use crate::services::publish_gate::{decide, PublishGate};
use crate::services::reconcile::reconcile_collaborators;

/// Why the ordered steps stopped
enum StepFailure {
    /// Expected problems, already phrased for the user
    Rejected(ErrorAccumulator),
    /// Anything else; logged, never shown
    Fault(AppError),
}

impl From<AppError> for StepFailure {
    fn from(err: AppError) -> Self {
        StepFailure::Fault(err)
    }
}

/// Runs submissions against the repositories, the upload engine and the gate
#[derive(Clone)]
pub struct SubmissionCoordinator {
    repos: Repositories,
    engine: Arc<UploadEngine>,
    tokens: AntiForgery,
    gate: PublishGate,
    public_base_url: String,
}

impl SubmissionCoordinator {
    pub fn new(
        repos: Repositories,
        engine: Arc<UploadEngine>,
        tokens: AntiForgery,
        public_base_url: impl Into<String>,
    ) -> Self {
        let gate = PublishGate::new(repos.content.clone());
        Self {
            repos,
            engine,
            tokens,
            gate,
            public_base_url: public_base_url.into(),
        }
    }

    /// Create or edit one content item.
    ///
    /// Authorization is checked before any side effect. A failure after a new
    /// item was created deletes it again, so a retry is a clean first attempt.
    #[tracing::instrument(
        skip(self, actor, request),
        fields(
            actor_id = %actor.id,
            content_type = %request.content_type,
            content_id = ?request.content_id,
        )
    )]
    pub async fn submit(
        &self,
        actor: &Actor,
        request: SubmissionRequest,
    ) -> Result<SubmissionSuccess, SubmissionError> {
        let existing = self.authorize(actor, &request).await?;
        let schema = ContentSchema::for_type(request.content_type);

        let (item, guard) = match existing {
            Some(item) => (item, None),
            None => {
                let item = self.create_skeleton(actor, &request, &schema).await?;
                let guard = CreationGuard::new(self.repos.content.clone(), item.id);
                (item, Some(guard))
            }
        };

        match self.apply(actor, &schema, &item, request).await {
            Ok(success) => {
                if let Some(guard) = guard {
                    guard.disarm();
                }
                tracing::info!(
                    content_id = %success.id,
                    status = %success.status,
                    "Submission saved"
                );
                Ok(success)
            }
            Err(failure) => {
                let errors = match failure {
                    StepFailure::Rejected(errors) => {
                        tracing::debug!(errors = errors.len(), "Submission rejected");
                        errors
                    }
                    StepFailure::Fault(e) => {
                        tracing::error!(
                            error = %e.detailed_message(),
                            content_id = %item.id,
                            "Submission failed"
                        );
                        let mut errors = ErrorAccumulator::new();
                        errors.push_unexpected(GENERIC_FAILURE_MESSAGE);
                        errors
                    }
                };
                match guard {
                    Some(guard) => guard.rollback().await,
                    None if schema.publish_gated => self.regate_stored(item.id, &schema).await,
                    None => {}
                }
                Err(SubmissionError::Rejected(
                    errors.or_generic(GENERIC_FAILURE_MESSAGE),
                ))
            }
        }
    }

    /// Re-run the gate over whatever a failed edit left behind.
    ///
    /// Core fields are written before the step errors are known, so a failed
    /// edit may have cleared a field the published status depends on.
    async fn regate_stored(&self, content_id: Uuid, schema: &ContentSchema) {
        let current = match self.repos.content.get(content_id).await {
            Ok(Some(item)) => item.status,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload item after rejected edit");
                return;
            }
        };

        let decision = self.gate.gate(content_id, current, schema).await;
        if decision.effective_status == current {
            return;
        }

        match self
            .repos
            .content
            .set_status(content_id, decision.effective_status)
            .await
        {
            Ok(()) => tracing::info!(
                status = %decision.effective_status,
                "Rejected edit left item unpublishable, downgraded"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to downgrade item after rejected edit"),
        }
    }

    /// Token and ownership checks. Returns the stored item when editing.
    async fn authorize(
        &self,
        actor: &Actor,
        request: &SubmissionRequest,
    ) -> Result<Option<ContentItem>, SubmissionError> {
        if let Err(e) = self.tokens.verify(
            &request.token,
            &submit_action(request.content_type),
            &scope_for(request.content_id),
            actor.id,
        ) {
            tracing::debug!(error = %e, "Submission token rejected");
            return Err(SubmissionError::Unauthorized);
        }

        let Some(content_id) = request.content_id else {
            return Ok(None);
        };

        let item = match self.repos.content.get(content_id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                tracing::debug!("Submission targets an unknown item");
                return Err(SubmissionError::Unauthorized);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load item for authorization");
                return Err(generic_rejection());
            }
        };

        if item.content_type != request.content_type {
            tracing::debug!(stored_type = %item.content_type, "Submission type mismatch");
            return Err(SubmissionError::Unauthorized);
        }

        let owns = item.author_id == actor.id && item.status != ContentStatus::Private;
        if !owns && !actor.can(Capability::EditOthers) {
            tracing::debug!(author_id = %item.author_id, status = %item.status, "Actor may not edit item");
            return Err(SubmissionError::Unauthorized);
        }

        Ok(Some(item))
    }

    async fn create_skeleton(
        &self,
        actor: &Actor,
        request: &SubmissionRequest,
        schema: &ContentSchema,
    ) -> Result<ContentItem, SubmissionError> {
        let new = NewContent {
            content_type: request.content_type,
            author_id: actor.id,
            core: CoreFields {
                status: provisional_status(schema, request.core.status, None),
                ..request.core.clone()
            },
        };

        self.repos.content.create(&new).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create content skeleton");
            generic_rejection()
        })
    }

    async fn apply(
        &self,
        actor: &Actor,
        schema: &ContentSchema,
        item: &ContentItem,
        request: SubmissionRequest,
    ) -> Result<SubmissionSuccess, StepFailure> {
        let mut errors = ErrorAccumulator::new();
        let stored = self.repos.content.get_metadata(item.id).await?;

        let primary = match &request.primary_image {
            Some(file) => match self.engine.store_single(item.id, file).await {
                Ok(attachment) => attachment,
                Err(e) => {
                    tracing::debug!(error = %e, file_name = %file.name, "Primary image rejected");
                    errors.push(e.category(), e.client_message());
                    None
                }
            },
            None => None,
        };

        let gallery = self
            .engine
            .store_gallery(item.id, &request.gallery, &request.existing_gallery_ids)
            .await;
        errors.merge(gallery.errors);

        let core = CoreFields {
            status: provisional_status(schema, request.core.status, Some(item)),
            ..request.core.clone()
        };
        let saved = self.repos.content.update_core(item.id, &core).await?;

        let mut staged: BTreeMap<String, Value> = BTreeMap::new();

        if schema.has_collaborators() {
            let collaborators = if is_group(schema, &request.fields) {
                let proposed = id_list(&sanitize_field(
                    schema.field(COLLABORATORS_KEY).and_then(|f| f.sanitizer),
                    field_values(&request.fields, COLLABORATORS_KEY),
                ));
                let current = stored.get(COLLABORATORS_KEY).map(id_list).unwrap_or_default();
                reconcile_collaborators(
                    self.repos.users.as_ref(),
                    actor,
                    &proposed,
                    item.author_id,
                    &current,
                )
                .await?
            } else {
                Vec::new()
            };
            staged.insert(COLLABORATORS_KEY.to_string(), ids_value(&collaborators));
        }

        for field in schema.fields() {
            if field.id == COLLABORATORS_KEY {
                continue;
            }
            let value = if field.id == GALLERY_KEY {
                ids_value(&gallery.gallery_ids)
            } else {
                sanitize_field(field.sanitizer, field_values(&request.fields, field.id))
            };
            if field.always_update || !is_empty_value(&value) {
                staged.insert(field.id.to_string(), value);
            }
        }

        if !errors.is_empty() {
            return Err(StepFailure::Rejected(errors));
        }

        self.commit(schema, &saved, &stored, staged, primary.as_ref())
            .await?;

        let decision = if schema.publish_gated {
            let decision = self.gate.gate(item.id, request.core.status, schema).await;
            if decision.effective_status != saved.status {
                self.repos
                    .content
                    .set_status(item.id, decision.effective_status)
                    .await?;
            }
            decision
        } else {
            decide(saved.status, Vec::new())
        };

        Ok(SubmissionSuccess {
            message: decision.notice,
            id: item.id,
            href: self.permalink(item),
            status: decision.effective_status,
            violations: decision.violations,
        })
    }

    /// Write staged metadata that changed, the primary image and the classification
    async fn commit(
        &self,
        schema: &ContentSchema,
        item: &ContentItem,
        stored: &HashMap<String, Value>,
        staged: BTreeMap<String, Value>,
        primary: Option<&AttachmentRef>,
    ) -> Result<(), AppError> {
        let content = &self.repos.content;

        let mut written = 0usize;
        for (key, value) in &staged {
            if stored.get(key) != Some(value) {
                content.set_metadata(item.id, key, value).await?;
                written += 1;
            }
        }

        if let Some(primary) = primary {
            if item.primary_image_id != Some(primary.id) {
                content.set_primary_image(item.id, Some(primary.id)).await?;
            }
        }

        if let Some(taxonomy) = schema.classification_field {
            let term = staged
                .get(taxonomy)
                .or_else(|| stored.get(taxonomy))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|term| !term.is_empty());
            content.set_classification(item.id, taxonomy, term).await?;
        }

        tracing::debug!(
            content_id = %item.id,
            staged = staged.len(),
            written = written,
            "Metadata committed"
        );
        Ok(())
    }

    fn permalink(&self, item: &ContentItem) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            item.content_type.slug(),
            item.id
        )
    }
}

/// Status written with the core fields, before the gate has run.
///
/// A gated item never becomes published here; it keeps its stored status (or
/// starts as draft) until the gate decides on the committed state.
fn provisional_status(
    schema: &ContentSchema,
    requested: ContentStatus,
    existing: Option<&ContentItem>,
) -> ContentStatus {
    if schema.publish_gated && requested.requires_validation() {
        existing
            .map(|item| item.status)
            .unwrap_or_else(ContentStatus::fallback)
    } else {
        requested
    }
}

fn generic_rejection() -> SubmissionError {
    let mut errors = ErrorAccumulator::new();
    errors.push_unexpected(GENERIC_FAILURE_MESSAGE);
    SubmissionError::Rejected(errors)
}

fn field_values<'a>(fields: &'a HashMap<String, Vec<String>>, id: &str) -> &'a [String] {
    fields.get(id).map(Vec::as_slice).unwrap_or(&[])
}

fn is_group(schema: &ContentSchema, fields: &HashMap<String, Vec<String>>) -> bool {
    let creation_type = sanitize_field(
        schema.field(CREATION_TYPE_KEY).and_then(|f| f.sanitizer),
        field_values(fields, CREATION_TYPE_KEY),
    );
    creation_type.as_str() == Some(CREATION_TYPE_GROUP)
}

fn id_list(value: &Value) -> Vec<Uuid> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|id| Uuid::parse_str(id).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn ids_value(ids: &[Uuid]) -> Value {
    Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::models::ContentType;
    use serde_json::json;

    fn stored_item(status: ContentStatus) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            content_type: ContentType::Contest,
            author_id: Uuid::new_v4(),
            status,
            title: String::new(),
            body: String::new(),
            primary_image_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_provisional_status_never_publishes_gated_items() {
        let contest = ContentSchema::for_type(ContentType::Contest);
        assert_eq!(
            provisional_status(&contest, ContentStatus::Published, None),
            ContentStatus::Draft
        );
        let published = stored_item(ContentStatus::Published);
        assert_eq!(
            provisional_status(&contest, ContentStatus::Published, Some(&published)),
            ContentStatus::Published
        );
        assert_eq!(
            provisional_status(&contest, ContentStatus::Private, Some(&published)),
            ContentStatus::Private
        );

        let project = ContentSchema::for_type(ContentType::Project);
        assert_eq!(
            provisional_status(&project, ContentStatus::Published, None),
            ContentStatus::Published
        );
    }

    #[test]
    fn test_is_group_uses_sanitized_choice() {
        let schema = ContentSchema::for_type(ContentType::Project);
        let mut fields = HashMap::new();
        fields.insert(CREATION_TYPE_KEY.to_string(), vec![" Group ".to_string()]);
        assert!(is_group(&schema, &fields));

        fields.insert(CREATION_TYPE_KEY.to_string(), vec!["team".to_string()]);
        assert!(!is_group(&schema, &fields));
        assert!(!is_group(&schema, &HashMap::new()));
    }

    #[test]
    fn test_id_list_skips_garbage() {
        let id = Uuid::new_v4();
        let value = json!([id.to_string(), "not-an-id", 7]);
        assert_eq!(id_list(&value), vec![id]);
        assert!(id_list(&json!("plain")).is_empty());
        assert_eq!(ids_value(&[id]), json!([id.to_string()]));
    }
}
