//! Bypass Matcher Property Tests

use proptest::prelude::*;

use gateway_auth::{BypassMatcher, MatchMode};

use super::generators::{arb_bypass_pattern, arb_protected_path, arb_protected_segment};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: paths made only of unrelated segments are never exempt
    #[test]
    fn prop_protected_paths_require_auth(path in arb_protected_path()) {
        let matcher = BypassMatcher::with_defaults(MatchMode::Segment);
        prop_assert!(!matcher.should_bypass(&path));
    }

    /// Property: a bypass segment anywhere in the path exempts it
    #[test]
    fn prop_bypass_segment_at_any_depth(
        prefix in prop::collection::vec(arb_protected_segment(), 0..3),
        pattern in arb_bypass_pattern(),
        suffix in prop::collection::vec(arb_protected_segment(), 0..3),
    ) {
        let mut path = String::new();
        for segment in &prefix {
            path.push('/');
            path.push_str(segment);
        }
        path.push_str(pattern);
        for segment in &suffix {
            path.push('/');
            path.push_str(segment);
        }

        let matcher = BypassMatcher::with_defaults(MatchMode::Segment);
        prop_assert!(matcher.should_bypass(&path), "{} should bypass", path);
    }

    /// Property: segment mode never exempts more than substring mode
    #[test]
    fn prop_segment_is_stricter_than_substring(path in "(/[a-z-]{1,12}){1,4}") {
        let segment = BypassMatcher::with_defaults(MatchMode::Segment);
        let substring = BypassMatcher::with_defaults(MatchMode::Substring);
        if segment.should_bypass(&path) {
            prop_assert!(substring.should_bypass(&path));
        }
    }

    /// Property: the query string never influences the decision
    #[test]
    fn prop_query_is_ignored(
        path in arb_protected_path(),
        pattern in arb_bypass_pattern(),
    ) {
        let matcher = BypassMatcher::with_defaults(MatchMode::Segment);
        let smuggled = format!("{path}?next={pattern}");
        prop_assert!(!matcher.should_bypass(&smuggled));
    }
}
