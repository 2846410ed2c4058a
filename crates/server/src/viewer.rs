use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

const VIEWER_HEADER: &str = "x-viewer-id";

/// Request-scoped viewer identity, resolved once per request from the
/// `X-Viewer-Id` header and passed by value into the services. Absent header
/// means an anonymous viewer.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<i64>);

impl Viewer {
    /// The user id, or `Unauthorized` for anonymous viewers.
    pub fn require(self) -> Result<i64, ApiError> {
        self.0.ok_or(ApiError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(VIEWER_HEADER) {
            None => Ok(Viewer(None)),
            Some(value) => {
                let id = value
                    .to_str()
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| {
                        ApiError::BadRequest(format!("invalid {} header", VIEWER_HEADER))
                    })?;
                Ok(Viewer(Some(id)))
            }
        }
    }
}
