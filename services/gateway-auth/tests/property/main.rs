//! Property-Based Tests Module
//!
//! Uses proptest for invariant verification.
//!
//! Test categories:
//! - bypass: segment and substring matching
//! - extraction: bearer scheme handling
//! - error_sanitization: credentials never leak into responses
//! - token_validation: expired stays distinct from invalid

mod bypass;
mod error_sanitization;
mod generators;
