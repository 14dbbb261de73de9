//! Error handling module with typed rejection kinds
//!
//! This module provides the error taxonomy of the authentication gate:
//! - `ValidationError` for token decoding and verification failures
//! - `StoreError` for revocation store failures
//! - `AuthRejection`, the terminal outcome of a denied request
//! - `ErrorResponse`, the sanitized client-facing payload

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Sensitive patterns that should be sanitized from error messages
const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "credential",
    "bearer",
    "authorization",
    "eyj",
];

/// Failure kinds produced by the token validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No token string was supplied
    #[error("Token absent")]
    Absent,

    /// Token structure or claims could not be decoded
    #[error("Token malformed: {reason}")]
    Malformed {
        /// Description of the malformation
        reason: String,
    },

    /// Signature did not verify against the configured secret
    #[error("Token signature invalid")]
    SignatureInvalid,

    /// Token expiry lies in the past
    #[error("Token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => ValidationError::SignatureInvalid,
            ErrorKind::ExpiredSignature => ValidationError::Expired {
                expired_at: Utc::now(),
            },
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                ValidationError::Malformed {
                    reason: "Unexpected signing algorithm".to_string(),
                }
            }
            ErrorKind::MissingRequiredClaim(claim) => ValidationError::Malformed {
                reason: format!("Missing required claim: {claim}"),
            },
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => ValidationError::Malformed {
                reason: "Token could not be decoded".to_string(),
            },
            _ => ValidationError::Malformed {
                reason: "Token validation failed".to_string(),
            },
        }
    }
}

/// Revocation store failures. Every variant is treated as unavailable.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection or command failure reported by the backend
    #[error("Revocation store backend error: {0}")]
    Backend(String),

    /// Lookup exceeded its time budget
    #[error("Revocation store lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The store circuit is open after repeated failures
    #[error("Revocation store circuit open")]
    CircuitOpen {
        /// When the circuit may half-open
        retry_after: Duration,
    },
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(Duration::ZERO)
        } else {
            StoreError::Backend(sanitize_message(&err.to_string()))
        }
    }
}

impl StoreError {
    /// Suggested retry delay for clients.
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::CircuitOpen { retry_after } => *retry_after,
            _ => Duration::from_secs(1),
        }
    }
}

/// Terminal rejection of a request at the authentication gate.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthRejection {
    /// Path is not in canonical form and cannot be classified
    #[error("Request path not canonical")]
    InvalidPath,

    /// No bearer token was presented on a protected route
    #[error("Authentication required")]
    Unauthenticated,

    /// Token is present in the revocation store
    #[error("Token revoked")]
    TokenRevoked,

    /// Token has expired and may be refreshed by the client
    #[error("Token expired at {expired_at}")]
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },

    /// Token is malformed or its signature failed verification
    #[error("Token invalid: {source}")]
    TokenInvalid {
        /// Underlying validator failure
        #[source]
        source: ValidationError,
    },

    /// Revocation store could not answer
    #[error("Dependency unavailable: {service}")]
    DependencyUnavailable {
        /// Name of the unavailable dependency
        service: &'static str,
        /// Suggested retry duration
        retry_after: Duration,
    },
}

impl From<ValidationError> for AuthRejection {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Absent => AuthRejection::Unauthenticated,
            ValidationError::Expired { expired_at } => AuthRejection::TokenExpired { expired_at },
            other => AuthRejection::TokenInvalid { source: other },
        }
    }
}

impl From<StoreError> for AuthRejection {
    fn from(err: StoreError) -> Self {
        AuthRejection::DependencyUnavailable {
            service: "revocation-store",
            retry_after: err.retry_after(),
        }
    }
}

/// Error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "&'static str")]
pub enum ErrorCode {
    /// Path with dot segments or encoded separators
    InvalidPath,
    /// No bearer token on a protected route
    Unauthenticated,
    /// Token found in the revocation store
    TokenRevoked,
    /// Token past its expiry; refresh and retry
    TokenExpired,
    /// Token malformed or not authentic
    TokenInvalid,
    /// Revocation store could not answer
    DependencyUnavailable,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPath => "REQUEST_PATH_INVALID",
            Self::Unauthenticated => "AUTH_UNAUTHENTICATED",
            Self::TokenRevoked => "AUTH_TOKEN_REVOKED",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::TokenInvalid => "AUTH_TOKEN_INVALID",
            Self::DependencyUnavailable => "DEPENDENCY_UNAVAILABLE",
        }
    }

    /// Label used for the decision counter
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::InvalidPath => "invalid_path",
            Self::Unauthenticated => "unauthenticated",
            Self::TokenRevoked => "token_revoked",
            Self::TokenExpired => "token_expired",
            Self::TokenInvalid => "token_invalid",
            Self::DependencyUnavailable => "dependency_unavailable",
        }
    }

    /// Get the HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::TokenRevoked | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            Self::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// RFC 6750 challenge for 401 responses
    fn challenge(&self) -> Option<&'static str> {
        match self {
            Self::Unauthenticated => Some("Bearer"),
            Self::TokenRevoked => {
                Some(r#"Bearer error="invalid_token", error_description="The access token has been revoked""#)
            }
            Self::TokenExpired => {
                Some(r#"Bearer error="invalid_token", error_description="The access token expired""#)
            }
            Self::TokenInvalid => {
                Some(r#"Bearer error="invalid_token", error_description="The access token is invalid""#)
            }
            Self::InvalidPath | Self::DependencyUnavailable => None,
        }
    }
}

impl From<ErrorCode> for &'static str {
    fn from(code: ErrorCode) -> Self {
        code.as_str()
    }
}

impl AuthRejection {
    /// Get the error code for this rejection
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPath => ErrorCode::InvalidPath,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::TokenRevoked => ErrorCode::TokenRevoked,
            Self::TokenExpired { .. } => ErrorCode::TokenExpired,
            Self::TokenInvalid { .. } => ErrorCode::TokenInvalid,
            Self::DependencyUnavailable { .. } => ErrorCode::DependencyUnavailable,
        }
    }

    /// Only expired tokens are worth a refresh-token exchange
    pub fn is_refresh_eligible(&self) -> bool {
        matches!(self, Self::TokenExpired { .. })
    }

    /// Get retry-after duration if applicable
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::DependencyUnavailable { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Build the sanitized client payload
    pub fn to_response(&self, correlation_id: Uuid) -> ErrorResponse {
        ErrorResponse::from_rejection(self, correlation_id)
    }
}

/// Structured error response with correlation ID
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message (sanitized)
    pub message: String,
    /// Correlation ID for tracing
    pub correlation_id: Uuid,
    /// Optional retry-after duration
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl ErrorResponse {
    /// Create a new error response from a rejection
    pub fn from_rejection(rejection: &AuthRejection, correlation_id: Uuid) -> Self {
        let message = match rejection {
            AuthRejection::InvalidPath => "Request path is not canonical".to_string(),
            AuthRejection::Unauthenticated => "Authentication is required".to_string(),
            AuthRejection::TokenRevoked => "Credential has been logged out".to_string(),
            AuthRejection::TokenExpired { .. } => {
                "Credential has expired, refresh it and retry".to_string()
            }
            AuthRejection::TokenInvalid { source } => match source {
                ValidationError::SignatureInvalid => "Signature verification failed".to_string(),
                ValidationError::Malformed { reason } => sanitize_message(reason),
                _ => "Credential is invalid".to_string(),
            },
            AuthRejection::DependencyUnavailable { service, .. } => {
                format!("Service {service} temporarily unavailable")
            }
        };

        ErrorResponse {
            code: rejection.code(),
            message,
            correlation_id,
            retry_after: rejection.retry_after(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let challenge = self.code.challenge();
        let retry_after = self.retry_after;

        let mut response = (status, Json(self)).into_response();
        let headers = response.headers_mut();
        if let Some(challenge) = challenge {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        if let Some(retry_after) = retry_after {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                headers.insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Sanitize a message by removing sensitive information
pub fn sanitize_message(message: &str) -> String {
    if contains_sensitive_info(message) {
        return "Malformed request data".to_string();
    }
    message.to_string()
}

/// Check if a string contains sensitive information
pub fn contains_sensitive_info(text: &str) -> bool {
    let lower = text.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}
