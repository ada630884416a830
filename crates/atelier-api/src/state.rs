//! Application state shared by every handler.

use atelier_core::{AppError, Config};
use atelier_db::Repositories;
use atelier_infra::AntiForgery;
use atelier_processing::SizeCeiling;
use atelier_services::{Storage, SubmissionCoordinator, SubscriptionService, UploadEngine};
use std::sync::Arc;

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt: JwtService,
    pub tokens: AntiForgery,
    pub submissions: SubmissionCoordinator,
    pub subscriptions: SubscriptionService,
}

impl AppState {
    /// Wire the pipeline services over `repos` and `storage`
    pub fn new(config: Config, repos: Repositories, storage: Arc<dyn Storage>) -> Self {
        let jwt = JwtService::new(&config.jwt_secret, config.jwt_expiry_hours);
        let tokens = AntiForgery::new(config.csrf_secret.clone(), config.csrf_token_ttl_secs);

        let engine = UploadEngine::new(
            storage,
            repos.attachments.clone(),
            config.upload_limits,
        )
        .with_max_attempts(config.filename_max_attempts);

        let submissions = SubmissionCoordinator::new(
            repos.clone(),
            Arc::new(engine),
            tokens.clone(),
            config.public_base_url.clone(),
        );
        let subscriptions =
            SubscriptionService::new(repos, tokens.clone(), config.public_base_url.clone());

        Self {
            config,
            jwt,
            tokens,
            submissions,
            subscriptions,
        }
    }

    /// Largest accepted upload
    pub fn upload_ceiling(&self) -> SizeCeiling {
        SizeCeiling::new(self.config.upload_limits)
    }

    pub fn deadline_error(&self) -> AppError {
        AppError::Timeout(self.config.request_deadline_secs)
    }
}
