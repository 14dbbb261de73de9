//! Bearer token extraction from the `Authorization` header.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Case-sensitive scheme prefix
pub const BEARER_PREFIX: &str = "Bearer ";

/// Returns the bearer token, or `None` when the header is missing, not
/// valid UTF-8, uses another scheme, or carries an empty credential.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
