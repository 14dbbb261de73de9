//! Request path canonical form
//!
//! Bypass matching and forwarding must agree on which resource a request
//! names. Paths that an upstream could resolve differently from their raw
//! segments (dot segments, encoded dots or separators, backslashes) are not
//! canonical and never reach either.

/// Percent-encodings of `.`, `/` and `\`, compared case-insensitively
const ENCODED_SEPARATORS: [&str; 3] = ["%2e", "%2f", "%5c"];

/// True when `path` is absolute and free of dot segments and of anything
/// that decodes into one.
pub fn is_canonical(path: &str) -> bool {
    if !path.starts_with('/') || path.contains('\\') {
        return false;
    }

    let lower = path.to_ascii_lowercase();
    if ENCODED_SEPARATORS.iter().any(|enc| lower.contains(enc)) {
        return false;
    }

    !path.split('/').any(|segment| segment == "." || segment == "..")
}
