use serde::{Deserialize, Serialize};

use super::step::{HttpMethod, TestStep, Transport};

/// Which optional checks follow the status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checks {
    StatusOnly,
    StatusPayload,
    StatusPattern,
    StatusPayloadPattern,
}

impl Checks {
    #[must_use]
    pub const fn from_presence(payload: bool, pattern: bool) -> Self {
        match (payload, pattern) {
            (true, true) => Self::StatusPayloadPattern,
            (true, false) => Self::StatusPayload,
            (false, true) => Self::StatusPattern,
            (false, false) => Self::StatusOnly,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StatusOnly => "status_only",
            Self::StatusPayload => "status_payload",
            Self::StatusPattern => "status_pattern",
            Self::StatusPayloadPattern => "status_payload_pattern",
        }
    }

    #[must_use]
    pub const fn uses_payload(self) -> bool {
        matches!(self, Self::StatusPayload | Self::StatusPayloadPattern)
    }

    #[must_use]
    pub const fn uses_pattern(self) -> bool {
        matches!(self, Self::StatusPattern | Self::StatusPayloadPattern)
    }
}

/// The validation strategy chosen for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One of the method × checks combinations
    Method { method: HttpMethod, checks: Checks },
    /// Pattern evaluated line by line over a kubectl transcript
    KubectlPattern,
    /// GET compared against the payload saved from an earlier PUT
    GetCompareWithPut,
}

impl Strategy {
    /// Pick the strategy for a step whose method already parsed.
    ///
    /// Priority: kubectl transport with a pattern, then GET with a saved
    /// payload, then the presence of payload and pattern.
    #[must_use]
    pub fn select(step: &TestStep, method: HttpMethod, transport: Transport) -> Self {
        if transport == Transport::Kubectl && step.has_pattern() {
            return Self::KubectlPattern;
        }
        if method == HttpMethod::Get && step.has_saved_payload() {
            return Self::GetCompareWithPut;
        }
        Self::Method {
            method,
            checks: Checks::from_presence(step.has_payload(), step.has_pattern()),
        }
    }

    /// Snake-case name, e.g. `put_status_payload`.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Method { method, checks } => format!("{}_{}", method.slug(), checks.as_str()),
            Self::KubectlPattern => "kubectl_pattern".to_string(),
            Self::GetCompareWithPut => "get_compare_with_put".to_string(),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn twenty_method_strategies_are_distinct() {
        let mut names = HashSet::new();
        for method in HttpMethod::ALL {
            for (payload, pattern) in [(false, false), (true, false), (false, true), (true, true)] {
                let checks = Checks::from_presence(payload, pattern);
                names.insert(Strategy::Method { method, checks }.name());
            }
        }
        assert_eq!(names.len(), 20);
        assert!(names.contains("delete_status_payload_pattern"));
    }

    #[test]
    fn selection_by_presence() {
        let base = TestStep::new("s", "POST").with_status(201);
        let select = |step: &TestStep| Strategy::select(step, HttpMethod::Post, Transport::Http).name();

        assert_eq!(select(&base), "post_status_only");
        assert_eq!(select(&base.clone().with_payload(json!({"a": 1}))), "post_status_payload");
        assert_eq!(select(&base.clone().with_pattern("ok")), "post_status_pattern");
        assert_eq!(
            select(&base.with_payload(json!({"a": 1})).with_pattern("ok")),
            "post_status_payload_pattern"
        );
    }

    #[test]
    fn kubectl_pattern_wins_regardless_of_method() {
        let step = TestStep::new("logs", "DELETE").with_pattern("Started");
        assert_eq!(
            Strategy::select(&step, HttpMethod::Delete, Transport::Kubectl),
            Strategy::KubectlPattern
        );
        let no_pattern = TestStep::new("logs", "GET").with_status(200);
        assert_eq!(
            Strategy::select(&no_pattern, HttpMethod::Get, Transport::Kubectl).name(),
            "get_status_only"
        );
    }

    #[test]
    fn saved_payload_only_applies_to_get() {
        let step = TestStep {
            saved_payload: Some(json!({"name": "x"})),
            ..TestStep::new("read back", "GET")
        };
        assert_eq!(
            Strategy::select(&step, HttpMethod::Get, Transport::Http),
            Strategy::GetCompareWithPut
        );
        assert_eq!(
            Strategy::select(&step, HttpMethod::Patch, Transport::Http).name(),
            "patch_status_only"
        );
    }
}
