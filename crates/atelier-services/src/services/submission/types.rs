use atelier_core::models::{ContentStatus, ContentType, CoreFields, ErrorAccumulator};
use atelier_core::NOT_AUTHORIZED_MESSAGE;
use atelier_processing::UploadFile;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Everything a client sends with one submission.
///
/// There is no author field: the author of a new item is the acting actor and
/// the author of an existing item never changes.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub content_type: ContentType,
    /// `None` creates a new item
    pub content_id: Option<Uuid>,
    /// Anti-forgery token scoped to the content id (or "new")
    pub token: String,
    pub core: CoreFields,
    /// Raw metadata values keyed by field id; repeated keys keep every value
    pub fields: HashMap<String, Vec<String>>,
    pub primary_image: Option<UploadFile>,
    pub gallery: Vec<UploadFile>,
    /// Gallery attachment ids the client already holds, kept ahead of new uploads
    pub existing_gallery_ids: Vec<Uuid>,
}

impl SubmissionRequest {
    pub fn new(content_type: ContentType, content_id: Option<Uuid>, token: impl Into<String>) -> Self {
        Self {
            content_type,
            content_id,
            token: token.into(),
            core: CoreFields::default(),
            fields: HashMap::new(),
            primary_image: None,
            gallery: Vec::new(),
            existing_gallery_ids: Vec::new(),
        }
    }

    pub fn field(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.entry(id.into()).or_default().push(value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSuccess {
    pub message: String,
    pub id: Uuid,
    pub href: String,
    pub status: ContentStatus,
    /// Publish gate violations behind a forced downgrade, if any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// Bad token, wrong actor or unknown item; never says which
    #[error("submission not authorized")]
    Unauthorized,
    #[error("submission rejected with {} error(s)", .0.len())]
    Rejected(ErrorAccumulator),
}

impl SubmissionError {
    /// Grouped messages for the failure body
    pub fn into_errors(self) -> ErrorAccumulator {
        match self {
            SubmissionError::Unauthorized => {
                let mut errors = ErrorAccumulator::new();
                errors.push_unexpected(NOT_AUTHORIZED_MESSAGE);
                errors
            }
            SubmissionError::Rejected(errors) => errors,
        }
    }
}
