//! Configuration module
//!
//! Service configuration is read from the environment (after loading `.env`), with
//! defaults for everything except the database URL and the admin API key.

use std::env;
use std::path::PathBuf;

use crate::constants::DEFAULT_ANONYMOUS_UPLOADER;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 100;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const RECONCILE_INTERVAL_SECS: u64 = 3600;
const STAGING_MAX_AGE_SECS: u64 = 3600;
const CONTENT_DIR: &str = "uploads";

/// Minimum length accepted for `ADMIN_API_KEY`.
pub const MIN_ADMIN_KEY_LEN: usize = 32;

/// Log output format for the tracing subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    server_port: u16,
    environment: String,
    cors_origins: Vec<String>,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    content_dir: PathBuf,
    max_file_size_bytes: usize,
    admin_api_key: String,
    anonymous_uploader: String,
    http_concurrency_limit: usize,
    reconcile_interval_secs: u64,
    staging_max_age_secs: u64,
    log_format: LogFormat,
}

// Hand-written so the admin key and database credentials never reach the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("cors_origins", &self.cors_origins)
            .field("database_url", &"<redacted>")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_timeout_seconds", &self.db_timeout_seconds)
            .field("content_dir", &self.content_dir)
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .field("admin_api_key", &"<redacted>")
            .field("anonymous_uploader", &self.anonymous_uploader)
            .field("http_concurrency_limit", &self.http_concurrency_limit)
            .field("reconcile_interval_secs", &self.reconcile_interval_secs)
            .field("staging_max_age_secs", &self.staging_max_age_secs)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large"))?;

        let config = Config {
            server_port: var("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            content_dir: PathBuf::from(
                var("CONTENT_DIR").unwrap_or_else(|| CONTENT_DIR.to_string()),
            ),
            max_file_size_bytes,
            admin_api_key: var("ADMIN_API_KEY").ok_or_else(|| {
                anyhow::anyhow!(
                    "ADMIN_API_KEY must be set; the service has no default credentials"
                )
            })?,
            anonymous_uploader: var("ANONYMOUS_UPLOADER")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ANONYMOUS_UPLOADER.to_string()),
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            reconcile_interval_secs: var("RECONCILE_INTERVAL_SECS")
                .unwrap_or_else(|| RECONCILE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(RECONCILE_INTERVAL_SECS),
            staging_max_age_secs: var("STAGING_MAX_AGE_SECS")
                .unwrap_or_else(|| STAGING_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(STAGING_MAX_AGE_SECS),
            log_format: LogFormat::parse(&var("LOG_FORMAT").unwrap_or_default()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must start with postgres:// or postgresql://"
            ));
        }

        if self.admin_api_key.len() < MIN_ADMIN_KEY_LEN {
            return Err(anyhow::anyhow!(
                "ADMIN_API_KEY must be at least {} characters",
                MIN_ADMIN_KEY_LEN
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than 0"
            ));
        }

        if self.content_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("CONTENT_DIR must not be empty"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn content_dir(&self) -> &std::path::Path {
        &self.content_dir
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_bytes
    }

    pub fn admin_api_key(&self) -> &str {
        &self.admin_api_key
    }

    pub fn anonymous_uploader(&self) -> &str {
        &self.anonymous_uploader
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.http_concurrency_limit
    }

    /// Interval between background reconciliation sweeps; `0` disables them.
    pub fn reconcile_interval_secs(&self) -> u64 {
        self.reconcile_interval_secs
    }

    pub fn staging_max_age_secs(&self) -> u64 {
        self.staging_max_age_secs
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
