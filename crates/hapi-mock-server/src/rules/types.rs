//! Rule definition as stored, listed and persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Method or path value that matches anything.
pub const WILDCARD: &str = "*";

/// A matching directive: method/path predicate plus the canned response.
///
/// Every field has a default so partial JSON from the admin API is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// HTTP method or `*`
    pub method: String,
    /// Literal path, regex pattern, or `*`
    pub path: String,
    pub status_code: u16,
    pub response_body: Option<String>,
    pub response_headers: HashMap<String, String>,
    /// Milliseconds to wait before responding
    pub delay: u64,
    pub enabled: bool,
    /// Higher wins when several rules match
    pub priority: i32,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            method: WILDCARD.to_string(),
            path: WILDCARD.to_string(),
            status_code: 200,
            response_body: None,
            response_headers: HashMap::new(),
            delay: 0,
            enabled: true,
            priority: 0,
        }
    }
}

impl Rule {
    /// Shorthand used by tests and the benchmark.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults_from_empty_json() {
        let rule: Rule = serde_json::from_str("{}").unwrap();
        assert_eq!(rule, Rule::default());
        assert_eq!(rule.method, "*");
        assert_eq!(rule.path, "*");
        assert_eq!(rule.status_code, 200);
        assert!(rule.enabled);
        assert_eq!(rule.priority, 0);
    }

    #[test]
    fn test_rule_camel_case_fields() {
        let json = r#"{
            "name": "missing user",
            "method": "GET",
            "path": "/users/\\d+",
            "statusCode": 404,
            "responseBody": "{\"error\":\"not found\"}",
            "responseHeaders": {"Content-Type": "application/json"},
            "delay": 250,
            "enabled": false,
            "priority": 3
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.status_code, 404);
        assert_eq!(rule.path, r"/users/\d+");
        assert_eq!(
            rule.response_headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(rule.delay, 250);
        assert!(!rule.enabled);

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["responseBody"], "{\"error\":\"not found\"}");
    }

    #[test]
    fn test_negative_delay_rejected() {
        let result: Result<Rule, _> = serde_json::from_str(r#"{"delay": -5}"#);
        assert!(result.is_err());
    }
}
