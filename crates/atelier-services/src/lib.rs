//! Atelier Services Layer
//!
//! Business services of the submission pipeline: the submission coordinator,
//! collaborator reconciliation, the publish gate and contest subscription.
//! Keeps the API crate down to thin HTTP handling.

pub mod services;

pub use atelier_processing::{GalleryOutcome, UploadEngine, UploadError, UploadFile};
pub use atelier_storage::{create_storage, LocalStorage, Storage, StorageError, StorageResult};
pub use services::publish_gate::{GateDecision, GateSnapshot, PublishGate};
pub use services::reconcile::reconcile_collaborators;
pub use services::submission::{
    submit_action, SubmissionCoordinator, SubmissionError, SubmissionRequest, SubmissionSuccess,
};
pub use services::subscription::{
    SubscribeRequest, SubscribeResult, SubscriptionOutcome, SubscriptionService, SUBSCRIBE_ACTION,
};
