//! Downstream forwarding to the single configured upstream.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::path;

/// Largest request body buffered for forwarding
const MAX_FORWARD_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers that describe a single hop and are not forwarded
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
    header::CONTENT_LENGTH,
];

/// Why an inbound request has no upstream target.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    /// Path carries dot segments or encoded separators
    #[error("request path is not canonical")]
    NonCanonicalPath,
    /// Built URL would leave the configured scheme, host or port
    #[error("target leaves the configured upstream")]
    OutsideUpstream,
}

/// Proxies requests to the upstream base URL.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    upstream: Url,
}

impl Forwarder {
    /// Creates a forwarder with a per-request timeout
    pub fn new(upstream: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, upstream })
    }

    /// Router whose fallback forwards everything
    pub fn into_router(self) -> Router {
        Router::new().fallback(forward).with_state(self)
    }

    /// Upstream URL for an inbound path and query. The path is appended to
    /// the upstream's own path; scheme, host and port always stay the
    /// upstream's.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Result<Url, TargetError> {
        if !path::is_canonical(path) {
            return Err(TargetError::NonCanonicalPath);
        }

        let base = self.upstream.path().trim_end_matches('/');
        let mut url = self.upstream.clone();
        url.set_path(&format!("{base}{path}"));
        url.set_query(query);
        url.set_fragment(None);

        if url.scheme() != self.upstream.scheme()
            || url.host() != self.upstream.host()
            || url.port_or_known_default() != self.upstream.port_or_known_default()
        {
            return Err(TargetError::OutsideUpstream);
        }
        Ok(url)
    }
}

fn copy_headers(from: &HeaderMap) -> HeaderMap {
    let mut headers = from.clone();
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers
}

fn bad_gateway(message: &str) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "code": "UPSTREAM_UNAVAILABLE", "message": message })),
    )
        .into_response()
}

/// Fallback handler forwarding the request upstream
pub async fn forward(State(forwarder): State<Forwarder>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let url = match forwarder.target_url(parts.uri.path(), parts.uri.query()) {
        Ok(url) => url,
        Err(TargetError::NonCanonicalPath) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "code": "REQUEST_PATH_INVALID",
                    "message": "Request path is not canonical",
                })),
            )
                .into_response();
        }
        Err(err) => {
            warn!(error = %err, "Could not build upstream URL");
            return bad_gateway("Invalid upstream target");
        }
    };

    let body = match to_bytes(body, MAX_FORWARD_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let upstream = forwarder
        .client
        .request(parts.method, url)
        .headers(copy_headers(&parts.headers))
        .body(body)
        .send()
        .await;

    match upstream {
        Ok(response) => {
            let status = response.status();
            let headers = copy_headers(response.headers());
            let mut out = Response::new(Body::from_stream(response.bytes_stream()));
            *out.status_mut() = status;
            *out.headers_mut() = headers;
            out
        }
        Err(err) => {
            warn!(error = %err, timeout = err.is_timeout(), "Upstream request failed");
            bad_gateway("Upstream service unavailable")
        }
    }
}
