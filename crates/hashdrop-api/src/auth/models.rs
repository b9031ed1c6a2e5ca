use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hashdrop_core::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Anonymous,
}

/// Who is making the request, resolved once by `identity_middleware` and stored in
/// request extensions.
///
/// `uploader` is the opaque string recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub uploader: String,
}

impl Identity {
    pub fn admin(uploader: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            uploader: uploader.into(),
        }
    }

    pub fn anonymous(uploader: impl Into<String>) -> Self {
        Self {
            role: Role::Anonymous,
            uploader: uploader.into(),
        }
    }
}

// Extracted from parts so it can sit before `Multipart` in a handler signature.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Internal(
                "Identity middleware is not installed".to_string(),
            ))
        })
    }
}
