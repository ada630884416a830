//! Publish gate.
//!
//! Decides whether a requested move into `published` is allowed. The gate
//! never fails: load errors become a violation and the item falls back to
//! draft like any other failed validation.

use atelier_core::models::{ContentSchema, ContentStatus};
use atelier_core::validation::is_empty_value;
use atelier_db::ContentRepository;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const MISSING_TITLE: &str = "A title is required.";
pub const MISSING_BODY: &str = "A description is required.";
pub const MISSING_PRIMARY_IMAGE: &str = "A primary image is required.";
pub const DRAFT_NOTICE: &str = "This item is in draft/moderation and not visible to end users.";
pub const PUBLISHED_NOTICE: &str = "Your submission has been saved.";
pub const SAVED_HIDDEN_NOTICE: &str =
    "Your submission has been saved. It stays hidden from end users until it is published.";
const LOAD_FAILED: &str = "The item could not be checked for publication. Please try again.";

/// Stored state of an item as seen by the gate
#[derive(Debug, Clone, Copy)]
pub struct GateSnapshot<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub primary_image: Option<Uuid>,
    pub metadata: &'a HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub effective_status: ContentStatus,
    pub violations: Vec<String>,
    /// Closing notice shown to the submitting user
    pub notice: String,
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Whether the gate lets an item enter `to`.
///
/// Only entering `published` is conditional; the draft/private edges are free.
/// Re-saving an already published item counts as entering `published` again.
pub fn transition_allowed(to: ContentStatus, validation_passed: bool) -> bool {
    !to.requires_validation() || validation_passed
}

/// Run every check against `snapshot` when `requested` needs validation
pub fn evaluate(
    snapshot: GateSnapshot<'_>,
    requested: ContentStatus,
    schema: &ContentSchema,
) -> GateDecision {
    let mut violations = Vec::new();

    if requested.requires_validation() {
        if snapshot.title.trim().is_empty() {
            violations.push(MISSING_TITLE.to_string());
        }
        if snapshot.body.trim().is_empty() {
            violations.push(MISSING_BODY.to_string());
        }
        if snapshot.primary_image.is_none() {
            violations.push(MISSING_PRIMARY_IMAGE.to_string());
        }
        for field in schema.fields().filter(|f| f.required) {
            let missing = snapshot
                .metadata
                .get(field.id)
                .map(is_empty_value)
                .unwrap_or(true);
            if missing {
                violations.push(format!("{} is required.", field.label));
            }
        }
    }

    decide(requested, violations)
}

/// Turn a violation list into a decision for `requested`
pub fn decide(requested: ContentStatus, violations: Vec<String>) -> GateDecision {
    let passed = violations.is_empty();
    let effective_status = if transition_allowed(requested, passed) {
        requested
    } else {
        ContentStatus::fallback()
    };

    let notice = match (passed, effective_status.is_public()) {
        (true, true) => PUBLISHED_NOTICE,
        (true, false) => SAVED_HIDDEN_NOTICE,
        (false, _) => DRAFT_NOTICE,
    };

    GateDecision {
        effective_status,
        violations,
        notice: notice.to_string(),
    }
}

/// Loads the stored state of an item and evaluates it
#[derive(Clone)]
pub struct PublishGate {
    content: Arc<dyn ContentRepository>,
}

impl PublishGate {
    pub fn new(content: Arc<dyn ContentRepository>) -> Self {
        Self { content }
    }

    #[tracing::instrument(skip(self, schema), fields(content_id = %content_id, requested = %requested))]
    pub async fn gate(
        &self,
        content_id: Uuid,
        requested: ContentStatus,
        schema: &ContentSchema,
    ) -> GateDecision {
        if !requested.requires_validation() {
            return decide(requested, Vec::new());
        }

        let item = match self.content.get(content_id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                tracing::warn!("Publish gate ran against a missing item");
                return decide(requested, vec![LOAD_FAILED.to_string()]);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load item for publish gate");
                return decide(requested, vec![LOAD_FAILED.to_string()]);
            }
        };

        let metadata = match self.content.get_metadata(content_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load metadata for publish gate");
                return decide(requested, vec![LOAD_FAILED.to_string()]);
            }
        };

        let decision = evaluate(
            GateSnapshot {
                title: &item.title,
                body: &item.body,
                primary_image: item.primary_image_id,
                metadata: &metadata,
            },
            requested,
            schema,
        );

        if !decision.passed() {
            tracing::info!(
                violations = decision.violations.len(),
                effective_status = %decision.effective_status,
                "Publish gate downgraded item"
            );
        }

        decision
    }
}
