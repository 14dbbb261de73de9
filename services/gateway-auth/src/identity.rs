//! Authenticated identity carried with a single request
//!
//! The identity travels in the request's extensions for in-process handlers
//! and as the `X-User-Id` header for the forwarded request. Nothing outlives
//! the request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use uuid::Uuid;

use crate::error::{AuthRejection, ErrorResponse};
use crate::jwt::Claims;

/// Header carrying the authenticated user id downstream
pub static USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Header carrying the authenticated user's role downstream
pub static USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

/// Principal derived from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// User id (`sub`)
    pub subject: String,
    /// Role claim, when present
    pub role: Option<String>,
    /// Issued-at, unix seconds
    pub issued_at: i64,
    /// Expiry, unix seconds
    pub expires_at: i64,
}

impl AuthenticatedIdentity {
    /// Derive the identity from checked claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            subject: claims.sub.clone(),
            role: claims.role.clone(),
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }

    /// Attach to a request: extension plus downstream headers. Values that
    /// cannot be expressed as header values are left out of the headers.
    pub fn attach<B>(self, request: &mut Request<B>) {
        let headers = request.headers_mut();
        strip_identity_headers(headers);
        if let Ok(value) = HeaderValue::from_str(&self.subject) {
            headers.insert(USER_ID_HEADER.clone(), value);
        }
        if let Some(value) = self.role.as_deref().and_then(|r| HeaderValue::from_str(r).ok()) {
            headers.insert(USER_ROLE_HEADER.clone(), value);
        }
        request.extensions_mut().insert(self);
    }
}

/// Remove identity headers a client may have set itself.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(&USER_ID_HEADER);
    headers.remove(&USER_ROLE_HEADER);
}

impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or_else(|| AuthRejection::Unauthenticated.to_response(Uuid::new_v4()))
    }
}
