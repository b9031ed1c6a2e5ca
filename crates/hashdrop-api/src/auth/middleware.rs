//! Request identity and the admin gate.
//!
//! Every request gets an [`Identity`]: the configured admin token makes it `admin`,
//! anything else (including a wrong token) is anonymous. Admin routes are further
//! wrapped in [`require_admin`], which answers 401 instead of degrading to anonymous.

use crate::auth::models::Identity;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hashdrop_core::constants::ADMIN_IDENTITY;
use hashdrop_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Lets an authenticated admin attribute an upload to a named person.
pub const UPLOADER_HEADER: &str = "x-uploader";

const MAX_UPLOADER_LEN: usize = 64;

#[derive(Clone)]
pub struct AuthState {
    pub admin_api_key: String,
    pub anonymous_uploader: String,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

enum Credential<'a> {
    Missing,
    Malformed,
    Bearer(&'a str),
}

fn credential(headers: &HeaderMap) -> Credential<'_> {
    match headers.get("Authorization").map(|h| h.to_str()) {
        None => Credential::Missing,
        Some(Ok(value)) => match value.strip_prefix("Bearer ") {
            Some(token) => Credential::Bearer(token.trim()),
            None => Credential::Malformed,
        },
        Some(Err(_)) => Credential::Malformed,
    }
}

fn sanitize_uploader(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'))
        .take(MAX_UPLOADER_LEN)
        .collect()
}

fn resolve_identity(auth: &AuthState, headers: &HeaderMap) -> Identity {
    match credential(headers) {
        Credential::Bearer(token) if secure_compare(token, &auth.admin_api_key) => {
            let named = headers
                .get(UPLOADER_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(sanitize_uploader)
                .filter(|name| !name.is_empty());
            match named {
                Some(name) => Identity::admin(format!("{}:{}", ADMIN_IDENTITY, name)),
                None => Identity::admin(ADMIN_IDENTITY),
            }
        }
        Credential::Missing => Identity::anonymous(auth.anonymous_uploader.clone()),
        _ => {
            tracing::debug!("Unrecognized credential on request; treating as anonymous");
            Identity::anonymous(auth.anonymous_uploader.clone())
        }
    }
}

pub async fn identity_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = resolve_identity(&auth, request.headers());
    request.extensions_mut().insert(identity);
    next.run(request).await
}

pub async fn require_admin(
    State(auth): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let reason = match credential(request.headers()) {
        Credential::Bearer(token) if secure_compare(token, &auth.admin_api_key) => {
            return next.run(request).await;
        }
        Credential::Missing => "Missing authorization header",
        Credential::Malformed => "Invalid authorization header format",
        Credential::Bearer(_) => "Invalid API key",
    };

    tracing::warn!(
        path = %request.uri().path(),
        reason = reason,
        "Admin authentication failed"
    );
    HttpAppError(AppError::Unauthorized(reason.to_string())).into_response()
}
