//! Rule selection for inbound requests.
//!
//! Paths are compared twice: by exact equality and as a regular expression
//! (Rust `regex` syntax, anchored to the whole path). Either branch is enough.
//! The regex is compiled once when a rule enters the store.

use super::store::RuleStore;
use super::types::{Rule, WILDCARD};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Compiled path predicate of a rule.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    Any,
    Pattern {
        literal: String,
        /// `None` when the path is not a valid regex; only equality applies then.
        regex: Option<Regex>,
    },
}

impl PathMatcher {
    pub fn compile(path: &str) -> Self {
        if path == WILDCARD {
            return PathMatcher::Any;
        }
        let regex = match Regex::new(&format!("^(?:{path})$")) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("Rule path '{}' is not a valid regex, using exact match only: {}", path, e);
                None
            }
        };
        PathMatcher::Pattern {
            literal: path.to_string(),
            regex,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Any => true,
            PathMatcher::Pattern { literal, regex } => {
                regex.as_ref().is_some_and(|re| re.is_match(path)) || path == literal
            }
        }
    }
}

/// A stored rule together with its compiled predicate and insertion order.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Arc<Rule>,
    pub path_matcher: PathMatcher,
    /// Insertion sequence; lower means the rule entered the store earlier.
    pub seq: u64,
}

impl CompiledRule {
    pub fn compile(rule: Rule, seq: u64) -> Self {
        let path_matcher = PathMatcher::compile(&rule.path);
        Self {
            rule: Arc::new(rule),
            path_matcher,
            seq,
        }
    }

    fn method_matches(&self, method: &str) -> bool {
        self.rule.method == WILDCARD || self.rule.method.eq_ignore_ascii_case(method)
    }

    /// Enabled, and both method and path predicates hold.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.rule.enabled && self.method_matches(method) && self.path_matcher.matches(path)
    }
}

/// Highest priority rule among those matching; earliest inserted wins ties.
pub fn find_best_match<'a, I>(rules: I, method: &str, path: &str) -> Option<&'a CompiledRule>
where
    I: IntoIterator<Item = &'a CompiledRule>,
{
    rules
        .into_iter()
        .filter(|r| r.matches(method, path))
        .max_by(|a, b| {
            a.rule
                .priority
                .cmp(&b.rule.priority)
                .then_with(|| b.seq.cmp(&a.seq))
        })
}

/// Remove the mount prefix the mock endpoint is served under.
///
/// Only whole segments are stripped: with prefix `/mock`, `/mock/users`
/// becomes `/users`, `/mock` becomes `/`, and `/mockery` is left alone.
pub fn strip_mount_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Matching engine over a live [`RuleStore`].
///
/// Holds no copy of the rules; every call reads the store's current state.
#[derive(Clone)]
pub struct RuleMatcher {
    store: Arc<RuleStore>,
    mount_prefix: String,
}

impl RuleMatcher {
    pub fn new(store: Arc<RuleStore>, mount_prefix: impl Into<String>) -> Self {
        Self {
            store,
            mount_prefix: mount_prefix.into(),
        }
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Select the single best enabled rule for `method` and `path`.
    pub fn find_match(&self, method: &str, path: &str) -> Option<Rule> {
        let normalized = strip_mount_prefix(path, &self.mount_prefix);
        let found = self.store.best_match(method, normalized);
        debug!(
            "Finding matching rule for {} {} (matching against: {}) -> {}",
            method,
            path,
            normalized,
            found.as_ref().map(|r| r.name.as_str()).unwrap_or("none")
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(rules: Vec<Rule>) -> Vec<CompiledRule> {
        rules
            .into_iter()
            .enumerate()
            .map(|(i, r)| CompiledRule::compile(r, i as u64))
            .collect()
    }

    #[test]
    fn test_wildcard_matches_everything() {
        let rules = compiled(vec![Rule::new("*", "*")]);
        for (method, path) in [("GET", "/"), ("DELETE", "/a/b/c"), ("PATCH", "")] {
            assert!(find_best_match(&rules, method, path).is_some());
        }
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let rules = compiled(vec![Rule::new("get", "/ping")]);
        assert!(find_best_match(&rules, "GET", "/ping").is_some());
        assert!(find_best_match(&rules, "POST", "/ping").is_none());
    }

    #[test]
    fn test_regex_path_is_anchored() {
        let rules = compiled(vec![Rule::new("GET", r"/users/\d+")]);
        assert!(find_best_match(&rules, "GET", "/users/42").is_some());
        assert!(find_best_match(&rules, "GET", "/users/42/orders").is_none());
        assert!(find_best_match(&rules, "GET", "/api/users/42").is_none());
        assert!(find_best_match(&rules, "GET", "/users/abc").is_none());
    }

    #[test]
    fn test_invalid_regex_falls_back_to_exact() {
        let rules = compiled(vec![Rule::new("GET", "/files/[unclosed")]);
        assert!(matches!(
            rules[0].path_matcher,
            PathMatcher::Pattern { regex: None, .. }
        ));
        assert!(find_best_match(&rules, "GET", "/files/[unclosed").is_some());
        assert!(find_best_match(&rules, "GET", "/files/x").is_none());
    }

    #[test]
    fn test_literal_with_regex_metacharacters_matches_exactly() {
        // "." is a regex wildcard, but the literal branch still matches itself
        let rules = compiled(vec![Rule::new("GET", "/report.csv")]);
        assert!(find_best_match(&rules, "GET", "/report.csv").is_some());
        assert!(find_best_match(&rules, "GET", "/reportXcsv").is_some());
    }

    #[test]
    fn test_disabled_rules_never_match() {
        let mut rule = Rule::new("*", "*").with_priority(100);
        rule.enabled = false;
        let rules = compiled(vec![rule]);
        assert!(find_best_match(&rules, "GET", "/anything").is_none());
    }

    #[test]
    fn test_highest_priority_wins() {
        let mut low = Rule::new("GET", "/ping").with_priority(1);
        low.id = "low".into();
        let mut high = Rule::new("GET", "/ping").with_priority(5);
        high.id = "high".into();
        let rules = compiled(vec![low, high]);

        let best = find_best_match(&rules, "GET", "/ping").unwrap();
        assert_eq!(best.rule.id, "high");
    }

    #[test]
    fn test_priority_tie_prefers_earliest_insert() {
        let mut first = Rule::new("*", "*");
        first.id = "first".into();
        let mut second = Rule::new("GET", "/ping");
        second.id = "second".into();
        let rules = compiled(vec![first, second]);

        // Same result regardless of iteration order
        let best = find_best_match(&rules, "GET", "/ping").unwrap();
        assert_eq!(best.rule.id, "first");
        let best = find_best_match(rules.iter().rev(), "GET", "/ping").unwrap();
        assert_eq!(best.rule.id, "first");
    }

    #[test]
    fn test_strip_mount_prefix() {
        assert_eq!(strip_mount_prefix("/mock/users/42", "/mock"), "/users/42");
        assert_eq!(strip_mount_prefix("/mock", "/mock"), "/");
        assert_eq!(strip_mount_prefix("/mockery", "/mock"), "/mockery");
        assert_eq!(strip_mount_prefix("/users", "/mock"), "/users");
        assert_eq!(strip_mount_prefix("/users", ""), "/users");
    }
}
