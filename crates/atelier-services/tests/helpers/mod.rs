//! Test helpers: a coordinator wired to the in-memory repositories and a
//! filesystem store in a temporary directory.

pub mod fixtures;

use atelier_core::models::{Actor, ContentType, Role};
use atelier_core::UploadLimits;
use atelier_db::{InMemoryStore, Repositories};
use atelier_infra::{scope_for, AntiForgery};
use atelier_services::{
    submit_action, LocalStorage, Storage, SubmissionCoordinator, SubmissionRequest, UploadEngine,
};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const TEST_SECRET: &str = "pipeline-test-secret-0123456789abcdef";
pub const BASE_URL: &str = "https://atelier.example";

pub struct Pipeline {
    pub store: InMemoryStore,
    pub storage: Arc<dyn Storage>,
    pub tokens: AntiForgery,
    pub coordinator: SubmissionCoordinator,
    pub _temp_dir: TempDir,
}

impl Pipeline {
    /// Request for `content_type`, carrying a valid token for `actor`
    pub fn request(
        &self,
        actor: &Actor,
        content_type: ContentType,
        content_id: Option<Uuid>,
    ) -> SubmissionRequest {
        let token = self
            .tokens
            .issue(&submit_action(content_type), &scope_for(content_id), actor.id)
            .expect("token");
        SubmissionRequest::new(content_type, content_id, token)
    }
}

pub async fn setup_pipeline() -> Pipeline {
    let temp_dir = TempDir::new().expect("temp dir");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), "http://localhost/files".to_string())
            .await
            .expect("local storage"),
    );

    let store = InMemoryStore::new();
    let repos = Repositories::in_memory(store.clone());
    let engine = UploadEngine::new(
        storage.clone(),
        repos.attachments.clone(),
        UploadLimits::from_megabytes(8, 8, 128),
    );
    let tokens = AntiForgery::new(TEST_SECRET, 3600);
    let coordinator =
        SubmissionCoordinator::new(repos, Arc::new(engine), tokens.clone(), BASE_URL);

    Pipeline {
        store,
        storage,
        tokens,
        coordinator,
        _temp_dir: temp_dir,
    }
}

pub fn regular_actor() -> Actor {
    Actor::new(Uuid::new_v4(), vec![Role::Regular], vec![])
}

pub fn elevated_actor() -> Actor {
    Actor::new(Uuid::new_v4(), vec![Role::Elevated], vec![])
}
