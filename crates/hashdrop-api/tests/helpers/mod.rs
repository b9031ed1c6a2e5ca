//! Test helpers: build the full router on top of an in-memory catalog and a
//! temporary content directory.
//!
//! Run from workspace root: `cargo test -p hashdrop-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use hashdrop_api::setup::{routes, services};
use hashdrop_core::Config;
use hashdrop_db::MemoryCatalog;
use hashdrop_storage::LocalStorage;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_KEY: &str = "test-admin-key-0123456789abcdef-0123";

pub struct TestApp {
    pub server: TestServer,
    pub catalog: Arc<MemoryCatalog>,
    pub content_dir: TempDir,
}

pub async fn setup() -> TestApp {
    setup_with(&[]).await
}

pub async fn setup_with(overrides: &[(&str, &str)]) -> TestApp {
    let content_dir = tempfile::tempdir().expect("Failed to create content dir");

    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgres://unused@localhost/hashdrop".to_string(),
        ),
        ("ADMIN_API_KEY".to_string(), ADMIN_KEY.to_string()),
        (
            "CONTENT_DIR".to_string(),
            content_dir.path().display().to_string(),
        ),
        ("MAX_FILE_SIZE_MB".to_string(), "1".to_string()),
        ("RECONCILE_INTERVAL_SECS".to_string(), "0".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    let config = Config::from_vars(|key| vars.get(key).cloned()).expect("Invalid test config");

    let store = Arc::new(
        LocalStorage::new(config.content_dir())
            .await
            .expect("Failed to create local storage"),
    );
    let catalog = Arc::new(MemoryCatalog::new());

    let state = services::initialize_services(&config, catalog.clone(), store);
    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        catalog,
        content_dir,
    }
}

pub fn bearer(key: &str) -> String {
    format!("Bearer {}", key)
}

pub fn file_form(filename: &str, content: &[u8]) -> MultipartForm {
    let part = Part::bytes(content.to_vec())
        .file_name(filename.to_string())
        .mime_type("text/plain");
    MultipartForm::new().add_part("file", part)
}

/// Upload and return the JSON body, asserting success.
pub async fn upload(app: &TestApp, filename: &str, content: &[u8]) -> serde_json::Value {
    let response = app
        .server
        .post("/upload")
        .multipart(file_form(filename, content))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json()
}

pub async fn catalog_rows(app: &TestApp) -> i64 {
    use hashdrop_db::Catalog;
    app.catalog.count().await.expect("count failed")
}
