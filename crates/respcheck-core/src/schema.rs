//! Report interchange type and its JSON Schema
//!
//! Exporters and dashboards consume this shape verbatim; the field names of
//! [`Verdict`](crate::verdict::Verdict) and [`AuditRecord`] are a wire
//! contract.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditRecord, AuditSummary};
use crate::dispatch::StepOutcome;

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    /// Per-step outcomes from the dispatcher
    #[serde(default)]
    pub outcomes: Vec<StepOutcome>,
    /// Strict audit records, in audit order
    #[serde(default)]
    pub audit_records: Vec<AuditRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_summary: Option<AuditSummary>,
}

impl ValidationReport {
    /// Every step passed and the audit (if any) is compliant.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
            && self
                .audit_summary
                .as_ref()
                .is_none_or(|s| s.failed == 0 && s.errors == 0)
    }
}

/// Generate JSON Schema for [`ValidationReport`].
///
/// # Errors
///
/// Returns error if the schema cannot be serialized
pub fn generate_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(ValidationReport);
    serde_json::to_string_pretty(&schema)
}
