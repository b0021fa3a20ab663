//! Multi-strategy pattern search over a response body and headers
//!
//! Strategies run in a fixed order and stop at the first match:
//!
//! 1. substring (with whitespace/quote retries)
//! 2. key-value (`user.name:John`, `count=5`)
//! 3. regular expression
//! 4. JSONPath (`$.items[*].id`)
//! 5. parsed-JSON subset / array search
//!
//! A failed search therefore always carries one attempt per strategy; a
//! successful one ends with the matching strategy.

mod jsonpath;
mod key_value;

pub use jsonpath::JsonPath;
pub use key_value::{KeyValuePattern, flexible_match};

use regex::{Regex, RegexBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::{Body, Headers, is_container, values_equal};
use crate::subset::{all_primitive, contains_value, deep_array_search, is_subset};

/// Compiled-regex size cap; oversized patterns are reported as invalid.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Error compiling a pattern for the regex or JSONPath strategies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
    #[error("not a JSONPath expression (must start with '$')")]
    NotJsonPath,
    #[error("invalid JSONPath at position {position}: {message}")]
    InvalidJsonPath { position: usize, message: String },
}

/// One of the five pattern strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum MatchStrategy {
    #[serde(rename = "substring")]
    Substring,
    #[serde(rename = "key-value")]
    KeyValue,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "jsonpath")]
    JsonPath,
    #[serde(rename = "subset")]
    Subset,
}

impl MatchStrategy {
    /// Evaluation order.
    pub const ORDER: [Self; 5] = [
        Self::Substring,
        Self::KeyValue,
        Self::Regex,
        Self::JsonPath,
        Self::Subset,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::KeyValue => "key-value",
            Self::Regex => "regex",
            Self::JsonPath => "jsonpath",
            Self::Subset => "subset",
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one strategy tried against a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PatternAttempt {
    pub strategy: MatchStrategy,
    pub matched: bool,
    pub detail: String,
}

/// All attempts for one pattern, plus the overall outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PatternReport {
    pub attempts: Vec<PatternAttempt>,
    pub matched: bool,
}

impl PatternReport {
    /// The strategy that matched, if any.
    #[must_use]
    pub fn matched_by(&self) -> Option<MatchStrategy> {
        self.attempts.iter().find(|a| a.matched).map(|a| a.strategy)
    }
}

/// Search for `pattern` in the body and headers.
///
/// A blank pattern asserts nothing and never matches; no strategy is tried.
#[must_use]
pub fn match_pattern(pattern: &str, body: &Body, headers: Option<&Headers>) -> PatternReport {
    if pattern.trim().is_empty() {
        return PatternReport {
            attempts: Vec::new(),
            matched: false,
        };
    }
    let haystack = Haystack::new(body, headers);
    let mut attempts = Vec::with_capacity(MatchStrategy::ORDER.len());

    for strategy in MatchStrategy::ORDER {
        let (matched, detail) = match strategy {
            MatchStrategy::Substring => substring(pattern, &haystack),
            MatchStrategy::KeyValue => key_value(pattern, body, headers),
            MatchStrategy::Regex => regex_search(pattern, &haystack),
            MatchStrategy::JsonPath => jsonpath_search(pattern, body, headers),
            MatchStrategy::Subset => json_subset(pattern, body),
        };
        attempts.push(PatternAttempt {
            strategy,
            matched,
            detail,
        });
        if matched {
            return PatternReport {
                attempts,
                matched: true,
            };
        }
    }

    PatternReport {
        attempts,
        matched: false,
    }
}

/// Compile a pattern for the regex strategy.
///
/// # Errors
///
/// Returns [`PatternError::InvalidRegex`] for syntax errors or patterns that
/// exceed the compiled size limit.
pub fn compile_regex(pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| PatternError::InvalidRegex(e.to_string()))
}

/// Strip one layer of matching surrounding quotes.
#[must_use]
pub fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Texts searched by the substring and regex strategies.
struct Haystack {
    body: Vec<String>,
    headers: Vec<String>,
}

impl Haystack {
    fn new(body: &Body, headers: Option<&Headers>) -> Self {
        let mut body_texts = Vec::new();
        if !body.raw().is_empty() {
            body_texts.push(body.raw().to_string());
        }
        let serialized = body.serialized();
        if !body_texts.contains(&serialized) {
            body_texts.push(serialized);
        }

        let mut header_texts = Vec::new();
        if let Some(headers) = headers.filter(|h| !h.is_empty()) {
            header_texts.push(
                headers
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            if let Ok(json) = serde_json::to_string(headers) {
                header_texts.push(json);
            }
        }

        Self {
            body: body_texts,
            headers: header_texts,
        }
    }
}

// ── 1. substring ──

fn substring(pattern: &str, haystack: &Haystack) -> (bool, String) {
    let trimmed = pattern.trim();
    let mut variants = vec![pattern, trimmed, strip_quotes(trimmed)];
    variants.dedup();

    for variant in variants.iter().filter(|v| !v.is_empty()) {
        if haystack.body.iter().any(|t| t.contains(variant)) {
            return (true, format!("'{variant}' found in body"));
        }
        if haystack.headers.iter().any(|t| t.contains(variant)) {
            return (true, format!("'{variant}' found in headers"));
        }
    }
    (
        false,
        format!(
            "not found in body or headers ({} variant(s) tried)",
            variants.len()
        ),
    )
}

// ── 2. key-value ──

fn key_value(pattern: &str, body: &Body, headers: Option<&Headers>) -> (bool, String) {
    let Some(kv) = KeyValuePattern::parse(pattern) else {
        return (false, "not a key:value or key=value pattern".to_string());
    };

    if body.candidates().iter().any(|doc| kv.matches_value(doc)) {
        return (true, format!("key '{}' matched {} in body", kv.key(), kv.describe_targets()));
    }
    if headers.is_some_and(|h| kv.matches_headers(h)) {
        return (true, format!("key '{}' matched {} in headers", kv.key(), kv.describe_targets()));
    }
    (
        false,
        format!("key '{}' with {} not found", kv.key(), kv.describe_targets()),
    )
}

// ── 3. regex ──

fn regex_search(pattern: &str, haystack: &Haystack) -> (bool, String) {
    let re = match compile_regex(pattern) {
        Ok(re) => re,
        Err(e) => return (false, e.to_string()),
    };
    if haystack.body.iter().any(|t| re.is_match(t)) {
        return (true, "regex matched body".to_string());
    }
    if haystack.headers.iter().any(|t| re.is_match(t)) {
        return (true, "regex matched headers".to_string());
    }
    (false, "regex did not match body or headers".to_string())
}

// ── 4. JSONPath ──

fn jsonpath_search(pattern: &str, body: &Body, headers: Option<&Headers>) -> (bool, String) {
    let path = match JsonPath::parse(pattern.trim()) {
        Ok(path) => path,
        Err(e) => return (false, e.to_string()),
    };

    let body_hits: usize = body
        .candidates()
        .iter()
        .filter(|doc| is_container(doc))
        .map(|doc| path.select(doc).len())
        .sum();
    if body_hits > 0 {
        return (true, format!("{body_hits} result(s) in body"));
    }

    if let Some(headers) = headers.filter(|h| !h.is_empty()) {
        let header_doc = Value::Object(
            headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        );
        let header_hits = path.select(&header_doc).len();
        if header_hits > 0 {
            return (true, format!("{header_hits} result(s) in headers"));
        }
    }
    (false, "JSONPath returned no results".to_string())
}

// ── 5. parsed-JSON subset / array search ──

fn json_subset(pattern: &str, body: &Body) -> (bool, String) {
    let Ok(expected) = serde_json::from_str::<Value>(pattern.trim()) else {
        return (false, "pattern is not JSON".to_string());
    };

    let mut documents = body.candidates();
    if documents.is_empty() {
        documents.push(body.value().clone());
    }

    for doc in &documents {
        if let Some(detail) = json_fragment_matches(&expected, doc) {
            return (true, detail);
        }
    }
    (false, "JSON pattern not contained in body".to_string())
}

fn json_fragment_matches(expected: &Value, doc: &Value) -> Option<String> {
    let matched = match (expected, doc) {
        (Value::Object(_), Value::Object(_)) => {
            is_subset(expected, doc, true).then(|| "object pattern is a subset of body")
        }
        (Value::Object(_), Value::Array(items)) => items
            .iter()
            .any(|item| is_subset(expected, item, true))
            .then(|| "object pattern matches an array element"),
        (Value::Array(elements), _) if all_primitive(elements) => deep_array_search(doc, elements)
            .then(|| "all array values found in body"),
        (Value::Array(_), _) => {
            is_subset(expected, doc, true).then(|| "array pattern is a subset of body")
        }
        (scalar, _) => (values_equal(scalar, doc) || contains_value(doc, scalar))
            .then(|| "value found in body"),
    };
    matched.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn strategies(report: &PatternReport) -> Vec<MatchStrategy> {
        report.attempts.iter().map(|a| a.strategy).collect()
    }

    #[test]
    fn substring_short_circuits() {
        let body = Body::from_text(r#"{"status":"success","id":123}"#);
        let report = match_pattern(r#""status":"success""#, &body, None);
        assert!(report.matched);
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].strategy, MatchStrategy::Substring);
        assert!(report.attempts[0].matched);
    }

    #[test]
    fn no_match_records_all_five_strategies() {
        let body = Body::from_text(r#"{"status":"success"}"#);
        let report = match_pattern("definitely-absent", &body, None);
        assert!(!report.matched);
        assert_eq!(strategies(&report), MatchStrategy::ORDER.to_vec());
        assert!(report.attempts.iter().all(|a| !a.matched));
    }

    #[test]
    fn blank_pattern_never_matches() {
        let body = Body::from_text(r#"{"status":"success"}"#);
        for pattern in ["", "   ", "\n\t"] {
            let report = match_pattern(pattern, &body, None);
            assert!(!report.matched, "{pattern:?}");
            assert!(report.attempts.is_empty());
            assert_eq!(report.matched_by(), None);
        }
    }

    #[test]
    fn substring_retries_trimmed_and_unquoted() {
        let body = Body::from_text("pod nginx-7c is Running");
        assert!(match_pattern("  Running \n", &body, None).matched);
        let report = match_pattern("'nginx-7c'", &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::Substring));
    }

    #[test]
    fn substring_searches_headers() {
        let body = Body::from_text("{}");
        let h = headers(&[("Location", "/api/v1/users/9")]);
        let report = match_pattern("/users/9", &body, Some(&h));
        assert_eq!(report.matched_by(), Some(MatchStrategy::Substring));
        assert!(report.attempts[0].detail.contains("headers"));
    }

    #[test]
    fn substring_tolerates_reformatted_json() {
        // Raw text has spaces; the canonical form does not
        let body = Body::from_text("{\"b\": 2,\n \"a\": 1}");
        assert_eq!(
            match_pattern(r#""a":1"#, &body, None).matched_by(),
            Some(MatchStrategy::Substring)
        );
    }

    #[test]
    fn key_value_nested_lookup() {
        let body = Body::from_text(r#"{"data": [{"user": {"name": "John"}}]}"#);
        let report = match_pattern("user.name:John", &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::KeyValue));
        assert_eq!(report.attempts.len(), 2);
    }

    #[test]
    fn key_value_numeric_value() {
        let body = Body::from_text(r#"{"count": 5}"#);
        assert_eq!(
            match_pattern("count = 5", &body, None).matched_by(),
            Some(MatchStrategy::KeyValue)
        );
    }

    #[test]
    fn key_value_numeric_substring_is_permissive() {
        let body = Body::from_text(r#"{"person": {"age": 30}}"#);
        assert_eq!(
            match_pattern("age:3", &body, None).matched_by(),
            Some(MatchStrategy::KeyValue)
        );
    }

    #[test]
    fn key_value_in_headers() {
        let body = Body::from_text(r#"{"x": 1}"#);
        let h = headers(&[("Content-Type", "application/json; charset=utf-8")]);
        let report = match_pattern("content-type:application/json", &body, Some(&h));
        assert_eq!(report.matched_by(), Some(MatchStrategy::KeyValue));
        assert!(report.attempts[1].detail.contains("headers"));
    }

    #[test]
    fn key_value_searches_json_log_lines() {
        let body = Body::from_text(
            "{\"level\":\"info\",\"event\":\"start\"}\n{\"level\":\"error\",\"code\":503}\n",
        );
        assert_eq!(
            match_pattern("code:503", &body, None).matched_by(),
            Some(MatchStrategy::KeyValue)
        );
    }

    #[test]
    fn regex_strategy() {
        let body = Body::from_text(r#"{"id": "ab-1234"}"#);
        let report = match_pattern(r"ab-\d{4}", &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::Regex));
    }

    #[test]
    fn invalid_regex_is_recorded_not_raised() {
        let body = Body::from_text(r#"{"a": 1}"#);
        let report = match_pattern("([unclosed", &body, None);
        assert!(!report.matched);
        let regex_attempt = &report.attempts[2];
        assert_eq!(regex_attempt.strategy, MatchStrategy::Regex);
        assert!(regex_attempt.detail.starts_with("invalid regular expression"));
    }

    #[test]
    fn compile_regex_returns_typed_error() {
        assert!(compile_regex("a+b").is_ok());
        assert!(matches!(compile_regex("(a"), Err(PatternError::InvalidRegex(_))));
    }

    #[test]
    fn jsonpath_strategy() {
        let body = Body::from_text(r#"{"items": [{"id": 1}, {"id": 2, "tag": "x"}]}"#);
        let report = match_pattern("$.items[*].tag", &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::JsonPath));
    }

    #[test]
    fn jsonpath_non_path_pattern_is_soft_failure() {
        let body = Body::from_text(r#"{"a": 1}"#);
        let report = match_pattern("zzz", &body, None);
        assert!(report.attempts[3].detail.contains("JSONPath"));
    }

    #[test]
    fn subset_object_pattern_with_reordered_keys() {
        let body = Body::from_text(r#"{"id": 1, "user": {"name": "a", "role": "admin"}}"#);
        let report = match_pattern(r#"{"user": {"role": "admin"}, "id": 1}"#, &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::Subset));
    }

    #[test]
    fn subset_object_pattern_against_array_body() {
        let body = Body::from_text(r#"[{"id": 1, "state": "up"}, {"id": 2, "state": "down"}]"#);
        let report = match_pattern(r#"{"state": "down", "id": 2}"#, &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::Subset));
    }

    #[test]
    fn bracketed_pattern_can_be_claimed_by_regex_first() {
        // `["555"]` is also a valid character class, and regex runs before subset
        let body = Body::from_text(r#"{"msisdn": ["555"]}"#);
        let report = match_pattern(r#"["999"]"#, &body, None);
        assert_eq!(report.matched_by(), Some(MatchStrategy::Regex));
    }

    #[test]
    fn subset_primitive_array_found_at_depth() {
        let body = Body::from_text(r#"{"profile": {"imsi": ["001", "002"], "msisdn": ["555"]}}"#);
        let (matched, detail) = json_subset(r#"["555", "001"]"#, &body);
        assert!(matched);
        assert_eq!(detail, "all array values found in body");
        assert!(!json_subset(r#"["555", "003"]"#, &body).0);
    }

    #[test]
    fn subset_array_of_objects() {
        let body = Body::from_text(r#"[{"a": 1, "b": 2}, {"a": 3}]"#);
        let (matched, detail) = json_subset(r#"[{"a": 3}, {"b": 2}]"#, &body);
        assert!(matched);
        assert_eq!(detail, "array pattern is a subset of body");
    }

    #[test]
    fn subset_scalar_pattern_found_at_depth() {
        let body = Body::from_text(r#"{"a": {"b": [1, 42]}}"#);
        assert!(json_subset("42", &body).0);
        assert!(!json_subset("43", &body).0);
    }

    #[test]
    fn subset_mismatch_fails_all() {
        let body = Body::from_text(r#"{"user": {"role": "viewer"}}"#);
        let report = match_pattern(r#"{"user": {"role": "admin"}}"#, &body, None);
        assert!(!report.matched);
        assert_eq!(report.attempts.len(), 5);
    }

    #[test]
    fn strip_quotes_one_layer() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("\"'abc'\""), "'abc'");
        assert_eq!(strip_quotes("\"abc'"), "\"abc'");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn attempt_serializes_strategy_names() {
        let attempt = PatternAttempt {
            strategy: MatchStrategy::KeyValue,
            matched: false,
            detail: String::new(),
        };
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["strategy"], json!("key-value"));
    }
}
