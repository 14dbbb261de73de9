//! Tower Layer installing the authentication filter in front of a service.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{AuthDecision, AuthFilter};
use crate::identity::strip_identity_headers;

/// Authentication layer for Tower
#[derive(Clone)]
pub struct AuthLayer {
    filter: Arc<AuthFilter>,
}

impl AuthLayer {
    /// Creates a new authentication layer
    pub fn new(filter: Arc<AuthFilter>) -> Self {
        Self { filter }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            filter: self.filter.clone(),
        }
    }
}

/// Authentication service wrapper
pub struct AuthService<S> {
    inner: S,
    filter: Arc<AuthFilter>,
}

impl<S: Clone> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<S, B> Service<Request<B>> for AuthService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // Keep the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let filter = self.filter.clone();

        let correlation_id = Uuid::new_v4();
        let span = info_span!(
            "authenticate",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                // Only the head is borrowed across the lookup; bodies need not be Sync.
                let (mut parts, body) = req.into_parts();
                strip_identity_headers(&mut parts.headers);

                let decision = filter.evaluate(parts.uri.path(), &parts.headers).await;
                let mut req = Request::from_parts(parts, body);
                match decision {
                    Ok(AuthDecision::Bypassed { .. }) => inner.call(req).await,
                    Ok(AuthDecision::Authenticated(identity)) => {
                        identity.attach(&mut req);
                        inner.call(req).await
                    }
                    Err(rejection) => Ok(rejection.to_response(correlation_id).into_response()),
                }
            }
            .instrument(span),
        )
    }
}
