//! Error Sanitization Property Tests
//!
//! Validates that credential material never reaches an error response.

use proptest::prelude::*;
use uuid::Uuid;

use gateway_auth::error::{contains_sensitive_info, sanitize_message};
use gateway_auth::{AuthRejection, ValidationError};

use super::generators::{arb_sensitive_content, arb_token};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: sanitized output never contains sensitive markers
    #[test]
    fn prop_sanitize_removes_sensitive(content in arb_sensitive_content()) {
        let sanitized = sanitize_message(&content);
        prop_assert!(!contains_sensitive_info(&sanitized));
    }

    /// Property: malformed-token reasons quoting the token are scrubbed
    #[test]
    fn prop_rejection_body_never_echoes_token(token in arb_token()) {
        let rejection: AuthRejection = ValidationError::Malformed {
            reason: format!("could not decode eyJ{token}"),
        }
        .into();

        let response = rejection.to_response(Uuid::new_v4());
        let body = serde_json::to_string(&response).unwrap();
        prop_assert!(!body.contains(&token));
    }
}
