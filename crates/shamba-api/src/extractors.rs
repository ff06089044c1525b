//! Custom Axum Extractors
//!
//! Request extractors for authentication, validated JSON and the public
//! origin used to build absolute image URLs.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use http::header::HOST;
use serde::de::DeserializeOwned;
use shamba_types::User;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Authenticated User Extractor
// =============================================================================

/// The user behind the request's bearer token.
///
/// Rejects with 401 when the header is absent, the token does not verify,
/// or the user no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = state.auth.authenticate(&parts.headers).await?;
        Ok(CurrentUser(user))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// JSON extractor with validation
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + validator::Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Request Origin Extractor
// =============================================================================

/// Scheme and host the client used to reach us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    /// Absolute URL for a stored path such as `uploads/plough.png`
    pub fn url(&self, stored: &str) -> String {
        format!(
            "{}://{}/{}",
            self.scheme,
            self.host,
            stored.replace('\\', "/").trim_start_matches('/')
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scheme = header("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
        let host = header(HOST.as_str())
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Ok(RequestOrigin { scheme, host })
    }
}
