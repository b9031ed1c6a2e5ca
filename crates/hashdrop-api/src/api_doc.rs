//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use hashdrop_core::models;
use hashdrop_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hashdrop API",
        version = "0.1.0",
        description = "File upload service that records a SHA-256 digest of every stored file and exposes it for later audit."
    ),
    paths(
        handlers::upload::upload_file,
        handlers::audit::audit_upload,
        handlers::download::download_upload,
        handlers::verify::verify_upload,
        handlers::admin::list_uploads,
        handlers::admin::integrity,
        handlers::admin::reconcile,
    ),
    components(
        schemas(
            models::UploadRecord,
            models::UploadResponse,
            models::AuditReport,
            models::VerifyReport,
            models::UploadListResponse,
            models::ReconcileReport,
            ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "uploads", description = "Upload and download of files"),
        (name = "audit", description = "Recorded digests and re-verification"),
        (name = "admin", description = "Catalog listing, integrity map and reconciliation (admin key required)"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}
