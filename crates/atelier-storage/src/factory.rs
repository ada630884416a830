use crate::{LocalStorage, Storage, StorageResult};
use atelier_core::Config;
use std::sync::Arc;

/// Create the storage backend described by the configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(
        config.local_storage_path.clone(),
        config.local_storage_base_url.clone(),
    )
    .await?;

    tracing::info!(
        path = %config.local_storage_path,
        base_url = %config.local_storage_base_url,
        "Local storage initialized"
    );

    Ok(Arc::new(storage))
}
