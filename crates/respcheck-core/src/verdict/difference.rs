//! Itemized differences between expected and actual JSON

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of discrepancy at a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Present in expected, absent in actual
    Missing,
    /// Present in actual, absent in expected
    Extra,
    /// Present in both, values differ
    Mismatch,
}

impl DifferenceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Extra => "extra",
            Self::Mismatch => "mismatch",
        }
    }
}

impl std::fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discrepancy between expected and actual at a specific field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Difference {
    pub kind: DifferenceKind,
    /// Dotted/bracketed address, e.g. `items[2].id`
    pub field_path: String,
    #[serde(default)]
    pub expected_value: Option<Value>,
    #[serde(default)]
    pub actual_value: Option<Value>,
}

impl Difference {
    #[must_use]
    pub fn missing(field_path: impl Into<String>, expected: &Value) -> Self {
        Self {
            kind: DifferenceKind::Missing,
            field_path: field_path.into(),
            expected_value: Some(expected.clone()),
            actual_value: None,
        }
    }

    #[must_use]
    pub fn extra(field_path: impl Into<String>, actual: &Value) -> Self {
        Self {
            kind: DifferenceKind::Extra,
            field_path: field_path.into(),
            expected_value: None,
            actual_value: Some(actual.clone()),
        }
    }

    #[must_use]
    pub fn mismatch(field_path: impl Into<String>, expected: &Value, actual: &Value) -> Self {
        Self {
            kind: DifferenceKind::Mismatch,
            field_path: field_path.into(),
            expected_value: Some(expected.clone()),
            actual_value: Some(actual.clone()),
        }
    }
}

impl std::fmt::Display for Difference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map_or_else(|| "<absent>".to_string(), Value::to_string);
        write!(
            f,
            "{} at {}: expected {}, actual {}",
            self.kind,
            self.field_path,
            show(&self.expected_value),
            show(&self.actual_value)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_mismatch() {
        let d = Difference::mismatch("user.age", &json!(30), &json!(31));
        assert_eq!(d.to_string(), "mismatch at user.age: expected 30, actual 31");
    }

    #[test]
    fn display_missing() {
        let d = Difference::missing("items[1]", &json!("b"));
        assert_eq!(d.to_string(), r#"missing at items[1]: expected "b", actual <absent>"#);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&DifferenceKind::Mismatch).unwrap();
        assert_eq!(json, "\"mismatch\"");
    }
}
