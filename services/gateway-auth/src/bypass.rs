//! Bypass rules for routes that skip authentication
//!
//! Documentation tooling, OAuth provider callbacks and the pre-login
//! endpoints (signup, login, email verification) reach the gateway without a
//! token. The matcher decides this from the path alone, before any
//! credential is looked at.

use std::str::FromStr;

/// How a pattern is compared against a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Pattern segments must appear as whole, contiguous path segments
    #[default]
    Segment,
    /// Pattern may appear anywhere in the path
    Substring,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment" => Ok(Self::Segment),
            "substring" => Ok(Self::Substring),
            other => Err(format!("unknown bypass match mode '{other}'")),
        }
    }
}

/// A named group of path patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassRule {
    name: String,
    patterns: Vec<String>,
}

impl BypassRule {
    /// Creates a rule group
    pub fn new(name: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }

    /// API documentation UI and its static assets
    pub fn swagger() -> Self {
        Self::from_static(
            "swagger",
            &[
                "/swagger-ui",
                "/v3/api-docs",
                "/webjars",
                "/favicon.ico",
                "/swagger-resources",
            ],
        )
    }

    /// OAuth provider authorize/redirect/callback flow
    pub fn oauth() -> Self {
        Self::from_static("oauth", &["/kapi", "/kauth", "/redirect", "/oauth"])
    }

    /// Registration, login and email verification
    pub fn public_auth() -> Self {
        Self::from_static("public-auth", &["/signup", "/login", "/emails"])
    }

    fn from_static(name: &str, patterns: &[&str]) -> Self {
        Self::new(name, patterns.iter().map(|p| p.to_string()).collect())
    }

    /// Rule group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns the first pattern matching `path`, if any
    pub fn matching_pattern(&self, path: &str, mode: MatchMode) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern_matches(pattern, path, mode))
            .map(String::as_str)
    }
}

/// Classifies paths against all bypass rule groups.
#[derive(Debug, Clone)]
pub struct BypassMatcher {
    rules: Vec<BypassRule>,
    mode: MatchMode,
}

impl BypassMatcher {
    /// Creates a matcher over the given rule groups
    pub fn new(rules: Vec<BypassRule>, mode: MatchMode) -> Self {
        Self { rules, mode }
    }

    /// Matcher with the three built-in groups
    pub fn with_defaults(mode: MatchMode) -> Self {
        Self::new(
            vec![
                BypassRule::swagger(),
                BypassRule::oauth(),
                BypassRule::public_auth(),
            ],
            mode,
        )
    }

    /// True when any rule group matches the path
    pub fn should_bypass(&self, path: &str) -> bool {
        self.matching_rule(path).is_some()
    }

    /// Name of the first matching rule group
    pub fn matching_rule(&self, path: &str) -> Option<&str> {
        let path = strip_query(path);
        self.rules
            .iter()
            .find(|rule| rule.matching_pattern(path, self.mode).is_some())
            .map(BypassRule::name)
    }

    /// Active match mode
    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

fn pattern_matches(pattern: &str, path: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Substring => !pattern.is_empty() && path.contains(pattern),
        MatchMode::Segment => segments_contain(path, pattern),
    }
}

/// True when the pattern's segments occur as a contiguous run in the path.
fn segments_contain(path: &str, pattern: &str) -> bool {
    let needle: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if needle.is_empty() {
        return false;
    }
    let haystack: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}
