//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p atelier-api`. Repositories are in
//! memory, attachments land in a temporary directory.

#![allow(dead_code)]

pub mod fixtures;

use atelier_api::constants;
use atelier_api::setup::routes;
use atelier_api::state::AppState;
use atelier_core::models::{Actor, Role};
use atelier_core::{Config, UploadLimits};
use atelier_db::{InMemoryStore, Repositories};
use atelier_services::{LocalStorage, Storage};
use axum_test::TestServer;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const BASE_URL: &str = "https://atelier.example";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, store, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: InMemoryStore,
    pub _temp_dir: TempDir,
}

/// An actor together with its bearer token
pub struct TestUser {
    pub actor: Actor,
    pub token: String,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn user(&self, role: Role) -> TestUser {
        let actor = Actor::new(Uuid::new_v4(), vec![role], vec![]);
        self.store.add_user(actor.id, role).await;
        let token = self.state.jwt.issue(&actor).expect("Failed to issue JWT");
        TestUser { actor, token }
    }

    /// Fetch an anti-forgery token through the API
    pub async fn form_token(&self, user: &TestUser, action: &str, scope: Option<Uuid>) -> String {
        let mut request = self
            .server
            .get(&api_path("/tokens"))
            .add_header("Authorization", format!("Bearer {}", user.token))
            .add_query_param("action", action);
        if let Some(scope) = scope {
            request = request.add_query_param("scope", scope.to_string());
        }
        let response = request.await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        body["token"]
            .as_str()
            .expect("Expected 'token' in response")
            .to_string()
    }
}

pub fn create_test_config(storage_path: &str) -> Config {
    Config {
        environment: "test".to_string(),
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        database_url: None,
        db_max_connections: 5,
        db_timeout_seconds: 5,
        jwt_secret: "api-test-jwt-secret-0123456789abcdef".to_string(),
        jwt_expiry_hours: 1,
        csrf_secret: "api-test-csrf-secret-0123456789abcdef".to_string(),
        csrf_token_ttl_secs: 3600,
        upload_limits: UploadLimits::from_megabytes(8, 8, 128),
        filename_max_attempts: 5,
        request_deadline_secs: 30,
        local_storage_path: storage_path.to_string(),
        local_storage_base_url: "http://localhost/files".to_string(),
        public_base_url: BASE_URL.to_string(),
    }
}

/// Setup test app with in-memory repositories and local storage.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().to_string_lossy().to_string();
    let config = create_test_config(&storage_path);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(temp_dir.path(), config.local_storage_base_url.clone())
            .await
            .expect("Failed to create local storage"),
    );

    let store = InMemoryStore::new();
    let repos = Repositories::in_memory(store.clone());
    let state = Arc::new(AppState::new(config.clone(), repos, storage));

    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        store,
        _temp_dir: temp_dir,
    }
}
