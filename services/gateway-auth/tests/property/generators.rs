//! Proptest Generators
//!
//! Shared generators for property-based tests.

use proptest::prelude::*;

/// A single path segment that is none of the default bypass words
pub fn arb_protected_segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,10}".prop_filter("must not be a bypass word", |s| {
        !matches!(
            s.as_str(),
            "kapi" | "kauth" | "redirect" | "oauth" | "signup" | "login" | "emails" | "webjars"
        )
    })
}

/// Absolute path built from protected segments only
pub fn arb_protected_path() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_protected_segment(), 1..5)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

/// One of the default public-auth or oauth patterns
pub fn arb_bypass_pattern() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("/signup"),
        Just("/login"),
        Just("/emails"),
        Just("/oauth"),
        Just("/kauth"),
        Just("/redirect"),
    ]
}

/// Token-shaped credential text
pub fn arb_token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{8,40}\\.[A-Za-z0-9_-]{8,40}\\.[A-Za-z0-9_-]{8,40}"
}

/// Authorization schemes other than the exact `Bearer `
pub fn arb_foreign_scheme() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("bearer "),
        Just("BEARER "),
        Just("Basic "),
        Just("Token "),
        Just("Bearer"),
        Just(""),
    ]
}

/// Messages that carry credential material
pub fn arb_sensitive_content() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("password=secret123".to_string()),
        Just("Bearer eyJhbGciOiJIUzI1NiJ9".to_string()),
        Just("authorization header rejected".to_string()),
        "[a-zA-Z0-9_]{5,20}".prop_map(|s| format!("token={s}")),
        "[a-zA-Z0-9_]{5,20}".prop_map(|s| format!("eyJ{s}")),
    ]
}
