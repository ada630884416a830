//! Submission transaction coordinator.
//!
//! One submission creates or edits a content item together with its uploads,
//! metadata, collaborators and classification. Either every step succeeds or
//! the caller gets a structured error, and a freshly created item is removed.

mod coordinator;
mod guard;
mod types;

pub use coordinator::SubmissionCoordinator;
pub use types::{SubmissionError, SubmissionRequest, SubmissionSuccess};

use atelier_core::models::ContentType;

/// Anti-forgery action name for submissions of `content_type`
pub fn submit_action(content_type: ContentType) -> String {
    format!("submit_{}", content_type.as_str())
}
