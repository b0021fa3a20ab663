//! Compliance-grade comparison: exact, order-sensitive, ERROR distinct from FAIL

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{AuditError, AuditInput, AuditRecord, AuditResult};
use crate::json::{Body, display_path, join_index, join_key, parse_container, values_equal};
use crate::validator::ResponseValidator;
use crate::verdict::Difference;

/// Positional differences between `expected` and `actual`.
///
/// Objects compare by key union, arrays index by index (length differences
/// become index-keyed `missing`/`extra` records), scalars by equality. A type
/// mismatch is reported once at the node and not descended into.
#[must_use]
pub fn strict_differences(expected: &Value, actual: &Value) -> Vec<Difference> {
    let mut out = Vec::new();
    walk(expected, actual, "", &mut out);
    out
}

fn walk(expected: &Value, actual: &Value, path: &str, out: &mut Vec<Difference>) {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            for (key, ev) in e {
                let child = join_key(path, key);
                match a.get(key) {
                    Some(av) => walk(ev, av, &child, out),
                    None => out.push(Difference::missing(child, ev)),
                }
            }
            for (key, av) in a.iter().filter(|(k, _)| !e.contains_key(*k)) {
                out.push(Difference::extra(join_key(path, key), av));
            }
        }
        (Value::Array(e), Value::Array(a)) => {
            for idx in 0..e.len().max(a.len()) {
                let child = join_index(path, idx);
                match (e.get(idx), a.get(idx)) {
                    (Some(ev), Some(av)) => walk(ev, av, &child, out),
                    (Some(ev), None) => out.push(Difference::missing(child, ev)),
                    (None, Some(av)) => out.push(Difference::extra(child, av)),
                    (None, None) => {}
                }
            }
        }
        _ => {
            if !values_equal(expected, actual) {
                out.push(Difference::mismatch(display_path(path), expected, actual));
            }
        }
    }
}

/// Evaluates [`AuditInput`]s into immutable [`AuditRecord`]s.
///
/// Holds the lenient validator only to attach its summary for side-by-side
/// reporting; the audit result never depends on it.
#[derive(Debug, Clone, Default)]
pub struct AuditComparator {
    standard: ResponseValidator,
}

impl AuditComparator {
    #[must_use]
    pub const fn new(standard: ResponseValidator) -> Self {
        Self { standard }
    }

    /// Audit one step, timestamped now.
    #[must_use]
    pub fn evaluate(&self, input: &AuditInput) -> AuditRecord {
        self.evaluate_at(input, Utc::now())
    }

    /// Audit one step with an explicit timestamp.
    #[must_use]
    pub fn evaluate_at(&self, input: &AuditInput, timestamp: DateTime<Utc>) -> AuditRecord {
        let mut record = AuditRecord::pending(input, timestamp);
        let body = Body::from_text(input.actual_response.as_str());

        if body.is_blank() {
            record.fail_with_error(&AuditError::EmptyResponse);
            return record;
        }

        if let Some(err) = method_error(input.http_method_expected.as_deref(), input.http_method_actual.as_deref()) {
            record.http_validation_errors.push(err);
        }
        if let Some(err) = status_error(input.status_code_expected, input.status_code_actual) {
            record.http_validation_errors.push(err);
        }

        let pattern = input.expected_pattern.trim();
        let expected_json = parse_container(pattern);
        match &expected_json {
            Some(expected) => {
                let Some(actual) = body.best_json() else {
                    record.json_validation_errors.push("response is not well-formed JSON".to_string());
                    record.fail_with_error(&AuditError::UnparseableResponse);
                    return record;
                };
                record.differences = strict_differences(expected, &actual);
                record
                    .json_validation_errors
                    .extend(record.differences.iter().map(ToString::to_string));
            }
            None => {
                if !pattern.is_empty() && !body.raw().contains(pattern) {
                    record
                        .json_validation_errors
                        .push(format!("expected pattern '{pattern}' not found in response"));
                }
            }
        }

        let headers = input.headers.as_ref();
        let standard = match &expected_json {
            Some(expected) => self.standard.validate(None, headers, &body, Some(expected)),
            None => self.standard.validate(Some(pattern), headers, &body, None),
        };
        record.standard_summary = Some(standard.summary);

        record.overall_result =
            if record.http_validation_errors.is_empty() && record.json_validation_errors.is_empty() {
                AuditResult::Pass
            } else {
                AuditResult::Fail
            };
        record
    }
}

/// Case-insensitive method comparison; both absent is a match.
fn method_error(expected: Option<&str>, actual: Option<&str>) -> Option<String> {
    let expected = expected.map(str::trim).filter(|m| !m.is_empty());
    let actual = actual.map(str::trim).filter(|m| !m.is_empty());
    match (expected, actual) {
        (None, None) => None,
        (Some(e), Some(a)) if e.eq_ignore_ascii_case(a) => None,
        (e, a) => Some(format!(
            "HTTP method mismatch: expected {}, actual {}",
            e.unwrap_or("<none>"),
            a.unwrap_or("<none>")
        )),
    }
}

/// Exact status comparison; both absent is a match.
fn status_error(expected: Option<u16>, actual: Option<u16>) -> Option<String> {
    if expected == actual {
        return None;
    }
    let show = |s: Option<u16>| s.map_or_else(|| "<none>".to_string(), |c| c.to_string());
    Some(format!(
        "status code mismatch: expected {}, actual {}",
        show(expected),
        show(actual)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::DifferenceKind;
    use serde_json::json;

    fn input(expected: &str, actual: &str) -> AuditInput {
        AuditInput::new("case", expected, actual)
    }

    // ── strict differences ──

    #[test]
    fn arrays_are_positional() {
        let diffs = strict_differences(&json!({"items": [1, 2, 3]}), &json!({"items": [3, 2, 1]}));
        let paths: Vec<_> = diffs.iter().map(|d| d.field_path.as_str()).collect();
        assert_eq!(paths, vec!["items[0]", "items[2]"]);
    }

    #[test]
    fn length_mismatch_is_index_keyed() {
        let diffs = strict_differences(&json!([1, 2]), &json!([1, 2, 3, 4]));
        assert_eq!(diffs.len(), 2);
        assert!(diffs.iter().all(|d| d.kind == DifferenceKind::Extra));
        assert_eq!(diffs[0].field_path, "[2]");

        let diffs = strict_differences(&json!({"a": [1, 2]}), &json!({"a": [1]}));
        assert_eq!(diffs, vec![Difference::missing("a[1]", &json!(2))]);
    }

    #[test]
    fn extra_and_missing_keys() {
        let diffs = strict_differences(&json!({"a": 1, "b": 2}), &json!({"a": 1, "c": 3}));
        assert_eq!(
            diffs,
            vec![Difference::missing("b", &json!(2)), Difference::extra("c", &json!(3))]
        );
    }

    #[test]
    fn type_mismatch_reported_once() {
        let diffs = strict_differences(&json!({"a": {"x": 1, "y": 2}}), &json!({"a": [1, 2]}));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DifferenceKind::Mismatch);
        assert_eq!(diffs[0].field_path, "a");
    }

    #[test]
    fn root_scalar_mismatch_uses_root_path() {
        let diffs = strict_differences(&json!(1), &json!(2));
        assert_eq!(diffs[0].field_path, "$");
    }

    // ── evaluation ──

    #[test]
    fn exact_match_passes() {
        let record = AuditComparator::default().evaluate(&input(r#"{"a": [1, 2]}"#, r#"{"a": [1, 2]}"#));
        assert_eq!(record.overall_result, AuditResult::Pass);
        assert!(record.differences.is_empty());
        assert_eq!(record.standard_summary.as_deref(), Some("PASSED: structure matches"));
    }

    #[test]
    fn reordered_array_fails_even_though_lenient_passes() {
        let record =
            AuditComparator::default().evaluate(&input(r#"{"items": [1, 2, 3]}"#, r#"{"items": [3, 2, 1]}"#));
        assert_eq!(record.overall_result, AuditResult::Fail);
        assert_eq!(record.differences.len(), 2);
        assert_eq!(record.standard_summary.as_deref(), Some("PASSED: structure matches"));
    }

    #[test]
    fn empty_response_is_error() {
        for actual in ["", "   \n"] {
            let record = AuditComparator::default().evaluate(&input(r#"{"a": 1}"#, actual));
            assert_eq!(record.overall_result, AuditResult::Error);
            assert!(record.error_detail.is_some());
        }
    }

    #[test]
    fn unparseable_response_for_json_expectation_is_error() {
        let record = AuditComparator::default().evaluate(&input(r#"{"a": 1}"#, "upstream connect error"));
        assert_eq!(record.overall_result, AuditResult::Error);
        assert_eq!(record.json_validation_errors.len(), 1);
    }

    #[test]
    fn text_pattern_is_substring() {
        let ok = AuditComparator::default().evaluate(&input("Running", "pod/nginx Running"));
        assert_eq!(ok.overall_result, AuditResult::Pass);
        let bad = AuditComparator::default().evaluate(&input("CrashLoop", "pod/nginx Running"));
        assert_eq!(bad.overall_result, AuditResult::Fail);
    }

    #[test]
    fn method_comparison_is_case_insensitive() {
        assert_eq!(method_error(Some("get"), Some("GET")), None);
        assert_eq!(method_error(None, None), None);
        assert!(method_error(Some("GET"), None).is_some());
        assert_eq!(
            method_error(Some("GET"), Some("POST")).as_deref(),
            Some("HTTP method mismatch: expected GET, actual POST")
        );
    }

    #[test]
    fn status_comparison_is_exact() {
        assert_eq!(status_error(None, None), None);
        assert_eq!(status_error(Some(200), Some(200)), None);
        assert!(status_error(Some(200), Some(201)).is_some());
        assert!(status_error(None, Some(200)).is_some());
    }

    #[test]
    fn status_mismatch_fails() {
        let mut case = input("ok", "ok");
        case.status_code_expected = Some(200);
        case.status_code_actual = Some(500);
        let record = AuditComparator::default().evaluate(&case);
        assert_eq!(record.overall_result, AuditResult::Fail);
        assert_eq!(record.http_validation_errors.len(), 1);
    }
}
