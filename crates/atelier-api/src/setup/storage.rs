//! Storage setup and initialization

use anyhow::{Context, Result};
use atelier_core::Config;
use atelier_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    create_storage(config)
        .await
        .context("Failed to initialize attachment storage")
}
