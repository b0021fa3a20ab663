use std::collections::HashMap;

use serde_json::Value;

use super::StepOutcome;
use super::step::{HttpMethod, TestStep};
use crate::validator::expected_payload;

/// Resource key used by steps that do not name one.
pub const DEFAULT_RESOURCE: &str = "default";

/// Write-then-read state across the steps of one workflow.
///
/// A passing PUT stores its payload under the step's resource key; a later
/// GET on the same resource receives it as `saved_payload`.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    saved: HashMap<String, Value>,
}

impl Workflow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The step as it should run, with any saved payload attached.
    #[must_use]
    pub fn prepare(&self, step: &TestStep) -> TestStep {
        let mut prepared = step.clone();
        if is_method(step, HttpMethod::Get) && !step.has_saved_payload() {
            if let Some(saved) = self.saved.get(resource_key(step)) {
                prepared.saved_payload = Some(saved.clone());
            }
        }
        prepared
    }

    /// Remember the payload of a passing PUT.
    ///
    /// The request body is saved when present, else the expected response payload.
    pub fn record(&mut self, step: &TestStep, outcome: &StepOutcome) {
        if !outcome.passed || !is_method(step, HttpMethod::Put) {
            return;
        }
        let payload = expected_payload(step.request_body.as_ref())
            .or_else(|| expected_payload(step.response_payload.as_ref()));
        if let Some(payload) = payload {
            self.saved.insert(resource_key(step).to_string(), payload);
        }
    }

    #[must_use]
    pub fn saved(&self, resource: &str) -> Option<&Value> {
        self.saved.get(resource)
    }
}

fn is_method(step: &TestStep, method: HttpMethod) -> bool {
    step.method.parse::<HttpMethod>().is_ok_and(|m| m == method)
}

fn resource_key(step: &TestStep) -> &str {
    step.resource
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_RESOURCE)
}
