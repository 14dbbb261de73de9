//! Gateway Auth - authentication gate for the API gateway.
//!
//! Every inbound request is either exempted by a bypass rule or must carry
//! a bearer token that is not blacklisted, verifies against the shared
//! secret and has not expired. Authenticated requests are forwarded with the
//! caller's identity attached.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod bypass;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod forward;
pub mod identity;
pub mod jwt;
pub mod observability;
pub mod path;
pub mod revocation;
pub mod shutdown;

pub use bypass::{BypassMatcher, BypassRule, MatchMode};
pub use config::Config;
pub use error::{AuthRejection, ErrorCode, ErrorResponse, StoreError, ValidationError};
pub use filter::{AuthDecision, AuthFilter, AuthLayer};
pub use identity::AuthenticatedIdentity;
pub use jwt::{Claims, TokenValidator};
pub use revocation::{InMemoryRevocationStore, RevocationStore};
