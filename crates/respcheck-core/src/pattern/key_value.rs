//! `key:value` / `key=value` assertions over nested JSON and headers
//!
//! Lookup tries the dotted path from the current node first, then scans every
//! nested container, so `user.name:John` matches however deep `user` sits.
//! Value comparison is lenient: exact equality, then substring containment
//! against the value's text form (`age:3` matches `30`).

use serde_json::Value;

use super::strip_quotes;
use crate::json::{Headers, is_container, parse_container, scalar_text, values_equal};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed key-value assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValuePattern {
    key: String,
    segments: Vec<Segment>,
    /// Accepted values; empty means "key is present"
    targets: Vec<Value>,
}

impl KeyValuePattern {
    /// Split a pattern on its first `:` or `=`.
    ///
    /// Returns `None` for JSON object/array literals and patterns without a
    /// separator or key.
    #[must_use]
    pub fn parse(pattern: &str) -> Option<Self> {
        let trimmed = pattern.trim();
        if parse_container(trimmed).is_some() {
            return None;
        }

        let split = trimmed.find([':', '='])?;
        let key = strip_quotes(trimmed[..split].trim()).trim();
        if key.is_empty() {
            return None;
        }

        let mut value_raw = trimmed[split + 1..].trim();
        if trimmed[split..].starts_with('=') {
            // `status==ok`
            value_raw = value_raw.trim_start_matches('=').trim();
        }

        Some(Self {
            key: key.to_string(),
            segments: parse_segments(key),
            targets: parse_targets(value_raw),
        })
    }

    /// The key as written in the pattern.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable form of the accepted values.
    #[must_use]
    pub fn describe_targets(&self) -> String {
        match self.targets.first() {
            None => "any value".to_string(),
            Some(first) => format!("value {first}"),
        }
    }

    /// Search a JSON document for the key holding an accepted value.
    #[must_use]
    pub fn matches_value(&self, document: &Value) -> bool {
        search(document, &self.segments, &self.targets)
    }

    /// Header lookup: case-insensitive name, exact or substring value.
    #[must_use]
    pub fn matches_headers(&self, headers: &Headers) -> bool {
        headers.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case(&self.key)
                && (self.targets.is_empty()
                    || self.targets.iter().any(|t| {
                        let text = scalar_text(t);
                        !text.is_empty() && (value == &text || value.contains(&text))
                    }))
        })
    }
}

/// `data.items[2].id` → `data`, `items`, `2`, `id`
fn parse_segments(key: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in key.split('.').filter(|p| !p.is_empty()) {
        let mut rest = part;
        if let Some(open) = rest.find('[') {
            let name = &rest[..open];
            if !name.is_empty() {
                segments.push(Segment::Key(name.to_string()));
            }
            rest = &rest[open..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else {
                    segments.push(Segment::Key(rest.to_string()));
                    break;
                };
                let inner = &stripped[..close];
                match inner.parse::<usize>() {
                    Ok(idx) => segments.push(Segment::Index(idx)),
                    Err(_) => segments.push(Segment::Key(strip_quotes(inner).to_string())),
                }
                rest = &stripped[close + 1..];
            }
        } else {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

/// The value is tried as JSON first (`5` → number) and always as plain text.
fn parse_targets(value_raw: &str) -> Vec<Value> {
    if value_raw.is_empty() {
        return Vec::new();
    }
    let mut targets = Vec::new();
    if let Ok(parsed) = serde_json::from_str::<Value>(value_raw) {
        targets.push(parsed);
    }
    let text = Value::String(strip_quotes(value_raw).to_string());
    if !targets.contains(&text) {
        targets.push(text);
    }
    targets
}

/// Direct path lookup, then a recursive scan of every nested container.
fn search(value: &Value, segments: &[Segment], targets: &[Value]) -> bool {
    if resolve(value, segments, targets) {
        return true;
    }
    match value {
        Value::Object(map) => map
            .values()
            .filter(|v| is_container(v))
            .any(|v| search(v, segments, targets)),
        Value::Array(items) => items
            .iter()
            .filter(|v| is_container(v))
            .any(|v| search(v, segments, targets)),
        _ => false,
    }
}

/// Follow `segments` from `value`; arrays are searched element-wise.
fn resolve(value: &Value, segments: &[Segment], targets: &[Value]) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return targets.is_empty() || targets.iter().any(|t| flexible_match(value, t));
    };
    match (head, value) {
        (Segment::Key(key), Value::Object(map)) => {
            map.get(key).is_some_and(|v| resolve(v, rest, targets))
        }
        (Segment::Index(idx), Value::Array(items)) => {
            items.get(*idx).is_some_and(|v| resolve(v, rest, targets))
        }
        (Segment::Key(_), Value::Array(items)) => {
            items.iter().any(|v| resolve(v, segments, targets))
        }
        _ => false,
    }
}

/// Lenient value comparison used by key-value patterns.
///
/// Exact (numerically lenient) equality first; then the target's text must be
/// contained in a string or number's text form. Arrays match if any element does.
#[must_use]
pub fn flexible_match(actual: &Value, target: &Value) -> bool {
    if values_equal(actual, target) {
        return true;
    }
    let text = scalar_text(target);
    match actual {
        Value::Array(items) => items.iter().any(|item| flexible_match(item, target)),
        Value::String(s) => !text.is_empty() && s.contains(&text),
        Value::Number(n) => !text.is_empty() && n.to_string().contains(&text),
        Value::Bool(b) => b.to_string() == text,
        Value::Null => text == "null",
        Value::Object(_) => false,
    }
}
