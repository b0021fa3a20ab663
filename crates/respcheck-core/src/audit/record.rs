use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{AuditError, AuditInput, AuditResult};
use crate::verdict::Difference;

/// One audited step. Built once by the comparator and never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditRecord {
    pub test_name: String,
    pub timestamp: DateTime<Utc>,
    pub expected_pattern: String,
    pub actual_response: String,
    pub http_method_expected: Option<String>,
    pub http_method_actual: Option<String>,
    pub status_code_expected: Option<u16>,
    pub status_code_actual: Option<u16>,
    /// Strict, positional differences
    #[serde(default)]
    pub differences: Vec<Difference>,
    #[serde(default)]
    pub http_validation_errors: Vec<String>,
    #[serde(default)]
    pub json_validation_errors: Vec<String>,
    pub overall_result: AuditResult,
    /// Summary line the lenient validator produced for the same inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl AuditRecord {
    pub(super) fn pending(input: &AuditInput, timestamp: DateTime<Utc>) -> Self {
        Self {
            test_name: input.test_name.clone(),
            timestamp,
            expected_pattern: input.expected_pattern.clone(),
            actual_response: input.actual_response.clone(),
            http_method_expected: input.http_method_expected.clone(),
            http_method_actual: input.http_method_actual.clone(),
            status_code_expected: input.status_code_expected,
            status_code_actual: input.status_code_actual,
            differences: Vec::new(),
            http_validation_errors: Vec::new(),
            json_validation_errors: Vec::new(),
            overall_result: AuditResult::Fail,
            standard_summary: None,
            error_detail: None,
        }
    }

    pub(super) fn fail_with_error(&mut self, error: &AuditError) {
        self.overall_result = AuditResult::Error;
        self.error_detail = Some(error.to_string());
    }
}

/// Whether an audited run may be signed off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compliant => f.write_str("COMPLIANT"),
            Self::NonCompliant => f.write_str("NON_COMPLIANT"),
        }
    }
}

/// Aggregate counts over a set of audit records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    /// Percentage of passed records; 0 when there are none
    pub pass_rate: f64,
    pub compliance_status: ComplianceStatus,
}

impl AuditSummary {
    /// One-line terminal rendering.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{} audited: {} passed, {} failed, {} errors ({:.2}% pass rate) - {}",
            self.total_tests,
            self.passed,
            self.failed,
            self.errors,
            self.pass_rate,
            self.compliance_status
        )
    }
}

/// Count results and decide compliance.
///
/// Compliant iff there are no failures and no errors; an empty set is
/// therefore compliant with a 0% pass rate.
#[must_use]
pub fn summarize(records: &[AuditRecord]) -> AuditSummary {
    let count = |result: AuditResult| records.iter().filter(|r| r.overall_result == result).count();
    let total_tests = records.len();
    let passed = count(AuditResult::Pass);
    let failed = count(AuditResult::Fail);
    let errors = count(AuditResult::Error);

    let pass_rate = if total_tests == 0 {
        0.0
    } else {
        (passed as f64 / total_tests as f64 * 10_000.0).round() / 100.0
    };

    AuditSummary {
        total_tests,
        passed,
        failed,
        errors,
        pass_rate,
        compliance_status: if failed == 0 && errors == 0 {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        },
    }
}
