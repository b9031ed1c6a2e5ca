//! Admin surface: authentication gate, listing, integrity map and reconciliation.

mod helpers;

use hashdrop_core::digest_bytes;
use helpers::{bearer, file_form, setup, upload, ADMIN_KEY};
use serde_json::Value;

#[tokio::test]
async fn admin_routes_require_the_admin_key() {
    let app = setup().await;

    let missing = app.server.get("/admin/uploads").await;
    assert_eq!(missing.status_code(), 401);
    let body: Value = missing.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["error"], "Missing authorization header");

    let wrong = app
        .server
        .get("/admin/integrity")
        .add_header("Authorization", bearer("wrong-key"))
        .await;
    assert_eq!(wrong.status_code(), 401);
    assert_eq!(wrong.json::<Value>()["error"], "Invalid API key");

    let malformed = app
        .server
        .post("/admin/reconcile")
        .add_header("Authorization", format!("Basic {}", ADMIN_KEY))
        .await;
    assert_eq!(malformed.status_code(), 401);
}

#[tokio::test]
async fn list_uploads_newest_first_with_pagination() {
    let app = setup().await;
    for name in ["one.txt", "two.txt", "three.txt"] {
        upload(&app, name, name.as_bytes()).await;
    }

    let response = app
        .server
        .get("/admin/uploads?limit=2&offset=0")
        .add_header("Authorization", bearer(ADMIN_KEY))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 2);
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["original_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["three.txt", "two.txt"]);
}

#[tokio::test]
async fn invalid_pagination_is_400() {
    let app = setup().await;
    for query in ["limit=0", "limit=501", "offset=-1", "limit=abc"] {
        let response = app
            .server
            .get(&format!("/admin/uploads?{}", query))
            .add_header("Authorization", bearer(ADMIN_KEY))
            .await;
        assert_eq!(response.status_code(), 400, "{query}");
    }
}

#[tokio::test]
async fn admin_uploader_header_is_recorded() {
    let app = setup().await;
    let response = app
        .server
        .post("/upload")
        .add_header("Authorization", bearer(ADMIN_KEY))
        .add_header("X-Uploader", "alice")
        .multipart(file_form("a.txt", b"a"))
        .await;
    assert_eq!(response.status_code(), 200);

    let listed: Value = app
        .server
        .get("/admin/uploads")
        .add_header("Authorization", bearer(ADMIN_KEY))
        .await
        .json();
    assert_eq!(listed["items"][0]["uploader"], "admin:alice");
}

#[tokio::test]
async fn integrity_map_has_latest_digest_per_name() {
    let app = setup().await;
    upload(&app, "report.pdf", b"v1").await;
    upload(&app, "notes.txt", b"notes").await;
    upload(&app, "report.pdf", b"v2").await;

    let map: Value = app
        .server
        .get("/admin/integrity")
        .add_header("Authorization", bearer(ADMIN_KEY))
        .await
        .json();
    assert_eq!(map.as_object().unwrap().len(), 2);
    assert_eq!(map["report.pdf"], digest_bytes(b"v2"));
    assert_eq!(map["notes.txt"], digest_bytes(b"notes"));
}

#[tokio::test]
async fn reconcile_reports_orphans_and_missing_files() {
    let app = setup().await;
    let kept = upload(&app, "kept.txt", b"kept").await;
    let gone = upload(&app, "gone.txt", b"gone").await;

    let gone_name = gone["stored_name"].as_str().unwrap();
    std::fs::remove_file(app.content_dir.path().join(gone_name)).unwrap();
    std::fs::write(app.content_dir.path().join("stray.bin"), b"stray").unwrap();

    let response = app
        .server
        .post("/admin/reconcile")
        .add_header("Authorization", bearer(ADMIN_KEY))
        .await;
    assert_eq!(response.status_code(), 200);
    let report: Value = response.json();
    assert_eq!(report["orphan_files"], serde_json::json!(["stray.bin"]));
    assert_eq!(report["missing_files"], serde_json::json!([gone_name]));
    assert_eq!(report["catalog_rows"], 2);

    let kept_name = kept["stored_name"].as_str().unwrap();
    assert!(app.content_dir.path().join(kept_name).is_file());
    assert!(app.content_dir.path().join("stray.bin").is_file());
}
