use crate::{ContentStore, LocalStorage, StorageResult};
use hashdrop_core::Config;
use std::sync::Arc;

/// Create the content store from configuration.
pub async fn create_content_store(config: &Config) -> StorageResult<Arc<dyn ContentStore>> {
    let storage = LocalStorage::new(config.content_dir()).await?;

    tracing::info!(
        content_dir = %config.content_dir().display(),
        "Content store initialized"
    );

    Ok(Arc::new(storage))
}
