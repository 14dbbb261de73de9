//! Gateway Flow Integration Tests
//!
//! Full request path: bypass, extraction, revocation lookup, validation and
//! identity propagation, observed through HTTP responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use gateway_auth::app::router;
use gateway_auth::circuit_breaker::CircuitBreaker;
use gateway_auth::jwt::TokenKind;
use gateway_auth::observability::GatewayMetrics;
use gateway_auth::revocation::{GuardedStore, KeyScheme};
use gateway_auth::{
    AuthFilter, AuthenticatedIdentity, BypassMatcher, Claims, InMemoryRevocationStore, MatchMode,
    RevocationStore, StoreError, TokenValidator,
};

const SECRET: &[u8] = b"integration-secret";

struct Harness {
    app: Router,
    store: Arc<InMemoryRevocationStore>,
    metrics: Arc<GatewayMetrics>,
}

async fn echo(identity: AuthenticatedIdentity, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "subject": identity.subject,
        "role": identity.role,
        "x_user_id": headers.get("x-user-id").and_then(|v| v.to_str().ok()),
    }))
}

async fn public() -> &'static str {
    "public"
}

fn downstream() -> Router {
    Router::new()
        .route("/orders", get(echo))
        .route("/users/login", get(public))
        .route("/swagger-ui/index.html", get(public))
}

fn build(store: Arc<dyn RevocationStore>, metrics: Arc<GatewayMetrics>) -> Router {
    let filter = AuthFilter::new(
        BypassMatcher::with_defaults(MatchMode::Segment),
        store,
        TokenValidator::from_secret(SECRET, Algorithm::HS256, 0),
    )
    .with_metrics(metrics.clone());
    router(Arc::new(filter), downstream(), metrics)
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryRevocationStore::new(KeyScheme::default()));
    let metrics = Arc::new(GatewayMetrics::new().unwrap());
    let app = build(store.clone(), metrics.clone());
    Harness {
        app,
        store,
        metrics,
    }
}

fn sign(claims: &Claims) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

fn access_token(sub: &str, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    sign(&Claims::new(sub, now - 10, now + exp_offset).with_role("ROLE_USER"))
}

fn request(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn valid_token_reaches_downstream_with_identity() {
    let h = harness();
    let token = access_token("user-42", 600);

    let response = h.app.oneshot(request("/orders", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["subject"], "user-42");
    assert_eq!(body["role"], "ROLE_USER");
    assert_eq!(body["x_user_id"], "user-42");
    assert_eq!(h.metrics.decision_count("authenticated"), 1);
}

#[tokio::test]
async fn missing_header_is_unauthenticated() {
    let h = harness();

    let response = h.app.oneshot(request("/orders", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let body = json_body(response).await;
    assert_eq!(body["code"], "AUTH_UNAUTHENTICATED");
    assert!(body["correlation_id"].is_string());
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthenticated() {
    let h = harness();
    let request = Request::builder()
        .uri("/orders")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTH_UNAUTHENTICATED");
}

#[tokio::test]
async fn revoked_token_is_rejected_even_when_valid() {
    let h = harness();
    let token = access_token("user-42", 600);
    h.store
        .blacklist(&token, Duration::from_secs(600))
        .await
        .unwrap();

    let response = h.app.oneshot(request("/orders", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTH_TOKEN_REVOKED");
    assert_eq!(h.metrics.decision_count("token_revoked"), 1);
}

#[tokio::test]
async fn expired_token_has_its_own_code() {
    let h = harness();
    let token = access_token("user-42", -60);

    let response = h.app.oneshot(request("/orders", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(challenge.contains("invalid_token"));
    assert_eq!(json_body(response).await["code"], "AUTH_TOKEN_EXPIRED");
}

#[tokio::test]
async fn bad_signature_is_invalid_not_expired() {
    let h = harness();
    let now = Utc::now().timestamp();
    let forged = encode(
        &Header::new(Algorithm::HS256),
        &Claims::new("user-42", now, now + 600),
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();

    let response = h.app.oneshot(request("/orders", Some(&forged))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["code"], "AUTH_TOKEN_INVALID");
    assert!(!body.to_string().contains(&forged));
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let h = harness();

    let response = h
        .app
        .oneshot(request("/orders", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTH_TOKEN_INVALID");
}

#[tokio::test]
async fn refresh_token_cannot_access_resources() {
    let h = harness();
    let now = Utc::now().timestamp();
    let refresh = sign(&Claims::new("user-42", now, now + 600).with_kind(TokenKind::Refresh));

    let response = h.app.oneshot(request("/orders", Some(&refresh))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTH_TOKEN_INVALID");
}

#[tokio::test]
async fn spoofed_identity_header_is_replaced() {
    let h = harness();
    let token = access_token("user-42", 600);
    let request = Request::builder()
        .uri("/orders")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("x-user-id", "admin")
        .body(Body::empty())
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["x_user_id"], "user-42");
}

#[tokio::test]
async fn bypass_routes_need_no_token() {
    let h = harness();

    let response = h
        .app
        .clone()
        .oneshot(request("/users/login", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = h
        .app
        .oneshot(request("/swagger-ui/index.html", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.metrics.decision_count("bypassed"), 2);
}

#[tokio::test]
async fn dot_segments_cannot_borrow_a_bypass() {
    let h = harness();

    let response = h
        .app
        .oneshot(request("/users/login/../../orders", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "REQUEST_PATH_INVALID");
    assert_eq!(h.metrics.decision_count("bypassed"), 0);
}

#[derive(Default)]
struct CountingStore {
    lookups: AtomicUsize,
}

#[async_trait]
impl RevocationStore for CountingStore {
    async fn is_blacklisted(&self, _token: &str) -> Result<bool, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }

    async fn blacklist(&self, _token: &str, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn bypass_never_consults_the_store() {
    let store = Arc::new(CountingStore::default());
    let app = build(store.clone(), Arc::new(GatewayMetrics::new().unwrap()));

    let response = app
        .oneshot(request("/users/login?next=/orders", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

struct HangingStore;

#[async_trait]
impl RevocationStore for HangingStore {
    async fn is_blacklisted(&self, _token: &str) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn blacklist(&self, _token: &str, _ttl: Duration) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn unreachable_store_fails_closed() {
    let guarded = GuardedStore::new(
        Arc::new(HangingStore),
        Duration::from_millis(20),
        CircuitBreaker::new("revocation-store", 5, Duration::from_secs(30)),
    );
    let app = build(Arc::new(guarded), Arc::new(GatewayMetrics::new().unwrap()));
    let token = access_token("user-42", 600);

    let response = app.oneshot(request("/orders", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(json_body(response).await["code"], "DEPENDENCY_UNAVAILABLE");
}

#[tokio::test]
async fn health_and_metrics_are_outside_the_gate() {
    let h = harness();

    let response = h.app.clone().oneshot(request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let _ = h.app.clone().oneshot(request("/orders", None)).await.unwrap();

    let response = h.app.oneshot(request("/metrics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("gateway_auth_decisions_total"));
}
