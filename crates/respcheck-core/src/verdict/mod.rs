//! Verdict module - difference records, summary table, and the unified verdict

mod difference;
mod summary;

pub use difference::{Difference, DifferenceKind};
pub use summary::{SummaryClass, classify, summarize};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::pattern::PatternAttempt;

/// Unified outcome of structural and pattern validation for one response.
///
/// `None` in `dict_match` / `pattern_match_overall` means "not evaluated".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub dict_match: Option<bool>,
    pub pattern_match_overall: Option<bool>,
    /// Structural match percentage, when a percentage-based comparison ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<f64>,
    #[serde(default)]
    pub differences: Vec<Difference>,
    #[serde(default)]
    pub pattern_matches: Vec<PatternAttempt>,
    pub summary: String,
    /// Diagnostics produced while validating (parse fallbacks, type mismatches)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Verdict {
    /// Verdict with nothing evaluated.
    #[must_use]
    pub fn skipped() -> Self {
        Self::from_parts(None, None)
    }

    /// Verdict for the given outcomes with the matching summary and no detail.
    #[must_use]
    pub fn from_parts(dict_match: Option<bool>, pattern_match_overall: Option<bool>) -> Self {
        Self {
            dict_match,
            pattern_match_overall,
            match_percentage: None,
            differences: Vec::new(),
            pattern_matches: Vec::new(),
            summary: summarize(dict_match, pattern_match_overall).to_string(),
            notes: Vec::new(),
        }
    }

    /// Replace the pattern outcome and recompute the summary.
    pub fn set_pattern(&mut self, matched: bool, attempts: Vec<PatternAttempt>) {
        self.pattern_match_overall = Some(matched);
        self.pattern_matches = attempts;
        self.summary = summarize(self.dict_match, self.pattern_match_overall).to_string();
    }

    /// Any evaluated signal came back false.
    #[must_use]
    pub fn has_failure(&self) -> bool {
        self.dict_match == Some(false) || self.pattern_match_overall == Some(false)
    }

    /// Nothing was evaluated.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.dict_match.is_none() && self.pattern_match_overall.is_none()
    }

    /// Classification of the summary string.
    #[must_use]
    pub fn class(&self) -> SummaryClass {
        classify(&self.summary).unwrap_or(SummaryClass::Failed)
    }
}
