//! JSON helpers shared by the comparators
//!
//! Lenient parsing (raw text falls back to a JSON string), body normalization for
//! kubectl/curl transcripts, canonical ordering for order-independent comparison,
//! and field-path construction.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response headers, keyed by header name as received.
pub type Headers = BTreeMap<String, String>;

/// Cheap pre-check: could `text` be a JSON object or array?
///
/// Only an optimization. Callers still treat a failed parse as authoritative.
#[must_use]
pub fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Parse text as JSON, or keep it as a JSON string when it is not valid JSON.
#[must_use]
pub fn parse_lenient(text: &str) -> Value {
    serde_json::from_str(text.trim()).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Parse text into a JSON object or array, ignoring scalars and invalid input.
#[must_use]
pub fn parse_container(text: &str) -> Option<Value> {
    if !looks_like_json(text) {
        return None;
    }
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(v @ (Value::Object(_) | Value::Array(_))) => Some(v),
        _ => None,
    }
}

/// Whether a value is an object or array.
#[must_use]
pub const fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Short type name used in structure tokens and difference messages.
#[must_use]
pub const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Equality with numeric leniency: `1` and `1.0` are equal.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x == y {
                return true;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(fx), Some(fy)) => fx == fy,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Text form of a scalar for substring comparisons (strings unquoted).
#[must_use]
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compact serialization with object keys sorted, independent of map ordering.
#[must_use]
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (key, val)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                // Key serialization of a plain string cannot fail
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

/// Remove the named object keys at every depth.
#[must_use]
pub fn strip_fields(value: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return value.clone();
    }
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), strip_fields(v, fields)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| strip_fields(v, fields)).collect()),
        scalar => scalar.clone(),
    }
}

/// `user` + `name` → `user.name`
#[must_use]
pub fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// `items` + 2 → `items[2]`
#[must_use]
pub fn join_index(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Path label used when the differing node is the document root.
pub const ROOT_PATH: &str = "$";

/// Display form of a path, mapping the empty root path to `$`.
#[must_use]
pub fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.to_string()
    }
}

/// A response body as captured: the raw text plus its JSON interpretation.
///
/// Raw text that is not valid JSON is kept as a JSON string so every comparator
/// can still run in string mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct Body {
    raw: String,
    value: Value,
    is_json: bool,
}

impl Body {
    /// Build from captured text, parsing it as JSON when possible.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let raw = text.into();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) if !raw.trim().is_empty() => Self {
                raw,
                value,
                is_json: true,
            },
            _ => Self {
                value: Value::String(raw.clone()),
                raw,
                is_json: false,
            },
        }
    }

    /// Build from an already-parsed value. A string value is re-parsed as text.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::from_text(text),
            Value::Null => Self::from_text(""),
            other => Self {
                raw: other.to_string(),
                value: other,
                is_json: true,
            },
        }
    }

    /// The captured text.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed JSON, or a JSON string holding the raw text.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the whole body parsed as JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.is_json
    }

    /// Empty or whitespace-only body.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Compact JSON form of the parsed value (raw text for non-JSON bodies).
    #[must_use]
    pub fn serialized(&self) -> String {
        if self.is_json {
            canonical_string(&self.value)
        } else {
            self.raw.clone()
        }
    }

    /// Each line of a newline-delimited JSON log that parses as an object or array.
    #[must_use]
    pub fn json_lines(&self) -> Vec<Value> {
        self.raw.lines().filter_map(parse_container).collect()
    }

    /// The outermost `{...}` or `[...]` slice of a transcript, if it parses.
    #[must_use]
    pub fn embedded_json(&self) -> Option<Value> {
        embedded_slice(&self.raw, '{', '}').or_else(|| embedded_slice(&self.raw, '[', ']'))
    }

    /// JSON documents to search: the whole body if it is JSON, otherwise
    /// newline-delimited records, otherwise JSON embedded in transcript text.
    #[must_use]
    pub fn candidates(&self) -> Vec<Value> {
        if self.is_json {
            return vec![self.value.clone()];
        }
        let lines = self.json_lines();
        if !lines.is_empty() {
            return lines;
        }
        self.embedded_json().into_iter().collect()
    }

    /// The body as a JSON document, looking through transcript noise.
    #[must_use]
    pub fn best_json(&self) -> Option<Value> {
        if self.is_json {
            return Some(self.value.clone());
        }
        self.embedded_json()
    }
}

fn embedded_slice(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    parse_container(&text[start..=end])
}

impl Default for Body {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<Body> for Value {
    fn from(body: Body) -> Self {
        if body.is_json {
            body.value
        } else {
            Self::String(body.raw)
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}
