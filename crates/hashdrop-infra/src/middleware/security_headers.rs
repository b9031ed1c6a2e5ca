use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};

static CACHED_IS_PRODUCTION: std::sync::LazyLock<bool> = std::sync::LazyLock::new(|| {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|e| e.to_lowercase() == "production" || e.to_lowercase() == "prod")
        .unwrap_or(false)
});

/// JSON endpoints and raw downloads never need to load anything.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

/// The RapiDoc page pulls its bundle from a CDN.
const DOCS_CSP: &str = "default-src 'self'; script-src 'self' https://unpkg.com; \
     style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self' data: https:; \
     connect-src 'self'";

/// Adds security headers to every response.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_docs = request.uri().path().starts_with("/docs");
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    if *CACHED_IS_PRODUCTION {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(if is_docs { DOCS_CSP } else { API_CSP }),
    );

    response
}
