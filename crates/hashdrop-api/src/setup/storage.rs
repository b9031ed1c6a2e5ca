//! Content store setup

use anyhow::{Context, Result};
use hashdrop_core::Config;
use hashdrop_storage::{create_content_store, ContentStore};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ContentStore>> {
    tracing::info!("Initializing content store...");
    let store = create_content_store(config)
        .await
        .with_context(|| {
            format!(
                "Failed to initialize content directory {}",
                config.content_dir().display()
            )
        })?;

    store
        .check_ready()
        .await
        .context("Content directory is not usable")?;

    Ok(store)
}
