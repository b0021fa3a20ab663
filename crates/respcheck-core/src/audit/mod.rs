//! Audit mode - strict, order-sensitive validation for compliance reporting
//!
//! Each audited step yields one immutable [`AuditRecord`] whose result is
//! PASS, FAIL (content mismatch) or ERROR (nothing usable came back). An
//! [`AuditSession`] accumulates records and summarizes them on demand.

mod record;
mod session;
mod strict;

pub use record::{AuditRecord, AuditSummary, ComplianceStatus, summarize};
pub use session::AuditSession;
pub use strict::{AuditComparator, strict_differences};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::json::Headers;

/// Terminal state of an audited step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditResult {
    Pass,
    Fail,
    /// Infrastructure problem, not a content mismatch
    Error,
}

impl AuditResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step ended in [`AuditResult::Error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("actual response is empty")]
    EmptyResponse,
    #[error("actual response is not parseable JSON but a JSON expectation was given")]
    UnparseableResponse,
}

/// Raw inputs for one audited step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditInput {
    pub test_name: String,
    /// JSON document or plain text expected in the response
    #[serde(default)]
    pub expected_pattern: String,
    #[serde(default)]
    pub actual_response: String,
    #[serde(default)]
    pub http_method_expected: Option<String>,
    #[serde(default)]
    pub http_method_actual: Option<String>,
    #[serde(default)]
    pub status_code_expected: Option<u16>,
    #[serde(default)]
    pub status_code_actual: Option<u16>,
    #[serde(default)]
    pub headers: Option<Headers>,
}

impl AuditInput {
    #[must_use]
    pub fn new(
        test_name: impl Into<String>,
        expected_pattern: impl Into<String>,
        actual_response: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            expected_pattern: expected_pattern.into(),
            actual_response: actual_response.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_methods(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.http_method_expected = Some(expected.into());
        self.http_method_actual = Some(actual.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, expected: u16, actual: u16) -> Self {
        self.status_code_expected = Some(expected);
        self.status_code_actual = Some(actual);
        self
    }
}
