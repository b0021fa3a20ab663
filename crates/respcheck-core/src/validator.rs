//! Response validation: structural expectation + pattern → one [`Verdict`]
//!
//! Malformed JSON on either side never raises. It degrades to string-mode
//! comparison and leaves a note on the verdict explaining what happened.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compare::structure_and_values;
use crate::json::{Body, Headers, parse_lenient, scalar_text, strip_fields, type_name, values_equal};
use crate::pattern::{PatternReport, match_pattern};
use crate::subset::is_subset;
use crate::verdict::{Difference, Verdict};

/// `dict_match` passes strictly above this percentage.
pub const DICT_MATCH_THRESHOLD: f64 = 50.0;

/// Options recognized by [`ResponseValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Object keys removed at every depth on both sides before comparing
    #[serde(default)]
    pub ignore_fields: Vec<String>,
    /// Extra fields in the response are permitted
    #[serde(default = "default_true")]
    pub partial_dict_match: bool,
    /// Arrays compare as multisets
    #[serde(default = "default_true")]
    pub ignore_array_order: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            ignore_fields: Vec::new(),
            partial_dict_match: true,
            ignore_array_order: true,
        }
    }
}

impl ValidationOptions {
    #[must_use]
    pub fn with_ignore_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignore_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_partial_dict_match(mut self, partial: bool) -> Self {
        self.partial_dict_match = partial;
        self
    }

    #[must_use]
    pub const fn with_ignore_array_order(mut self, ignore: bool) -> Self {
        self.ignore_array_order = ignore;
        self
    }
}

/// Outcome of the structural half of validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralCheck {
    pub matched: bool,
    pub match_percentage: Option<f64>,
    pub differences: Vec<Difference>,
    pub notes: Vec<String>,
}

impl StructuralCheck {
    fn outcome(matched: bool) -> Self {
        Self {
            matched,
            match_percentage: None,
            differences: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Combines structural comparison and pattern search into a [`Verdict`].
#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    options: ValidationOptions,
}

impl ResponseValidator {
    #[must_use]
    pub const fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a response against an optional pattern and optional payload.
    ///
    /// A `None`, `null` or blank payload means no structural expectation; a
    /// `None` or whitespace-only pattern means no pattern expectation.
    #[must_use]
    pub fn validate(
        &self,
        pattern: Option<&str>,
        headers: Option<&Headers>,
        body: &Body,
        payload: Option<&Value>,
    ) -> Verdict {
        let structural = expected_payload(payload).map(|expected| self.check_structure(body, &expected));
        let pattern_report = pattern
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.check_pattern(p, body, headers));

        let mut verdict = Verdict::from_parts(
            structural.as_ref().map(|s| s.matched),
            pattern_report.as_ref().map(|r| r.matched),
        );
        if let Some(check) = structural {
            verdict.match_percentage = check.match_percentage;
            verdict.differences = check.differences;
            verdict.notes = check.notes;
        }
        if let Some(report) = pattern_report {
            verdict.pattern_matches = report.attempts;
        }
        verdict
    }

    /// Structural half: compare the response body against `expected`.
    #[must_use]
    pub fn check_structure(&self, body: &Body, expected: &Value) -> StructuralCheck {
        if body.is_blank() {
            return StructuralCheck::outcome(false)
                .note("empty response body where a structured payload was expected");
        }

        let mut notes = Vec::new();
        let actual = match body.best_json() {
            Some(v) => {
                if !body.is_json() {
                    notes.push("JSON extracted from surrounding transcript text".to_string());
                }
                v
            }
            None => body.value().clone(),
        };

        let expected = strip_fields(expected, &self.options.ignore_fields);
        let actual = strip_fields(&actual, &self.options.ignore_fields);
        let partial = self.options.partial_dict_match;

        let mut check = match (&expected, &actual) {
            (Value::Object(_), Value::Object(_)) => {
                let mut result = structure_and_values(&expected, &actual, self.options.ignore_array_order);
                if partial {
                    result = result.without_extras();
                }
                StructuralCheck {
                    matched: result.match_percentage > DICT_MATCH_THRESHOLD,
                    match_percentage: Some(result.match_percentage),
                    differences: result.differences,
                    notes: Vec::new(),
                }
            }
            (Value::Object(_), Value::Array(items)) => {
                let matched = items.iter().any(|item| is_subset(&expected, item, partial));
                let check = StructuralCheck::outcome(matched);
                if matched {
                    check
                } else {
                    check.note("no array element contains the expected object")
                }
            }
            (Value::Array(wanted), Value::Array(items)) => {
                let missing = wanted
                    .iter()
                    .filter(|w| !items.iter().any(|item| is_subset(w, item, partial)))
                    .count();
                let check = StructuralCheck::outcome(missing == 0);
                if missing == 0 {
                    check
                } else {
                    check.note(format!("{missing} expected array element(s) not found in response"))
                }
            }
            (Value::Array(_) | Value::Object(_), Value::String(_)) if !body.is_json() => {
                StructuralCheck::outcome(false).note("response body is not JSON; structured payload expected")
            }
            (Value::Array(_) | Value::Object(_), other) => StructuralCheck::outcome(false).note(format!(
                "expected {}, response is {}",
                type_name(&expected),
                type_name(other)
            )),
            (scalar, other) => {
                let text = scalar_text(scalar);
                let matched = values_equal(scalar, other) || (!text.is_empty() && body.raw().contains(&text));
                StructuralCheck::outcome(matched)
            }
        };

        notes.append(&mut check.notes);
        check.notes = notes;
        check
    }

    /// Pattern half: run the five-strategy search.
    #[must_use]
    pub fn check_pattern(&self, pattern: &str, body: &Body, headers: Option<&Headers>) -> PatternReport {
        match_pattern(pattern, body, headers)
    }
}

/// Normalize a payload expectation: absent, `null` and blank strings mean none;
/// other strings are parsed as JSON when possible.
#[must_use]
pub fn expected_payload(payload: Option<&Value>) -> Option<Value> {
    match payload? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(parse_lenient(s)),
        other => Some(other.clone()),
    }
}
