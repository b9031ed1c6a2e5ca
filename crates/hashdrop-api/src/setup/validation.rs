//! Startup configuration checks
//!
//! `Config::from_env` already rejects invalid values; this pass re-runs those checks
//! and warns about settings that are legal but probably not intended.

use anyhow::Result;
use hashdrop_core::Config;

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if config.is_production() && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.staging_max_age_secs() < 60 {
        tracing::warn!(
            staging_max_age_secs = config.staging_max_age_secs(),
            "STAGING_MAX_AGE_SECS is very low - in-flight uploads may be removed"
        );
    }

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
    }

    Ok(())
}
