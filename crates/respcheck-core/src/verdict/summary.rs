//! Summary decision table
//!
//! Nine fixed strings over `dict_match × pattern_match_overall`. Report
//! generation classifies steps by the leading word, so the wording is frozen.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Leading classification word of a summary string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SummaryClass {
    Passed,
    Partial,
    Failed,
    Skipped,
}

impl SummaryClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Partial => "PARTIAL",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }
}

impl std::fmt::Display for SummaryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary string for a pair of structural/pattern outcomes.
///
/// `None` means "not evaluated" and is distinct from `Some(false)`.
#[must_use]
pub const fn summarize(dict_match: Option<bool>, pattern_match: Option<bool>) -> &'static str {
    match (dict_match, pattern_match) {
        (Some(true), Some(true)) => "PASSED: structure and content match",
        (Some(true), Some(false)) => "PARTIAL: structure correct but pattern missing",
        (Some(true), None) => "PASSED: structure matches",
        (Some(false), Some(true)) => "PARTIAL: pattern found but structure differs",
        (Some(false), Some(false)) => "FAILED: structure differs and pattern missing",
        (Some(false), None) => "FAILED: structure differs",
        (None, Some(true)) => "PASSED: pattern found",
        (None, Some(false)) => "FAILED: pattern not found",
        (None, None) => "SKIPPED: no validation criteria provided",
    }
}

/// Classify a summary string by its leading word.
#[must_use]
pub fn classify(summary: &str) -> Option<SummaryClass> {
    let head = summary.split(':').next()?.trim();
    [
        SummaryClass::Passed,
        SummaryClass::Partial,
        SummaryClass::Failed,
        SummaryClass::Skipped,
    ]
    .into_iter()
    .find(|class| class.as_str() == head)
}
