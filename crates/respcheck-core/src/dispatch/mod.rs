//! Validation strategy dispatch
//!
//! A test step declares any of expected status, expected payload and pattern.
//! The dispatcher picks exactly one [`Strategy`] from what is present, checks
//! the status first (failing fast), then hands payload and pattern to the
//! [`ResponseValidator`].

mod step;
mod strategy;
mod workflow;

pub use step::{HttpMethod, MethodParseError, StepResponse, TestStep, Transport};
pub use strategy::{Checks, Strategy};
pub use workflow::{DEFAULT_RESOURCE, Workflow};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ValidationConfig;
use crate::json::Body;
use crate::pattern::match_pattern;
use crate::status::StatusExpectation;
use crate::validator::ResponseValidator;
use crate::verdict::Verdict;

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepOutcome {
    pub step: String,
    /// Strategy name, e.g. `get_status_payload`
    pub strategy: String,
    pub passed: bool,
    pub reason: String,
    /// Absent when the step failed before payload/pattern evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl StepOutcome {
    fn failed(step: &TestStep, strategy: &str, reason: impl Into<String>) -> Self {
        Self {
            step: step.name.clone(),
            strategy: strategy.to_string(),
            passed: false,
            reason: reason.into(),
            verdict: None,
            notes: Vec::new(),
        }
    }
}

/// Selects and runs a validation strategy per step.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: ValidationConfig,
    validator: ResponseValidator,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            validator: ResponseValidator::new(config.options()),
            config,
        }
    }

    /// Dispatcher using the default config file if one exists, else defaults.
    #[must_use]
    pub fn with_fallback_config() -> Self {
        let config = ValidationConfig::load_default().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable validation config, using defaults");
            ValidationConfig::default()
        });
        Self::new(config)
    }

    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run one step against its response.
    #[must_use]
    pub fn run(&self, step: &TestStep, response: &StepResponse) -> StepOutcome {
        let strategy = if response.transport == Transport::Kubectl && step.has_pattern() {
            Strategy::KubectlPattern
        } else {
            match step.method.parse::<HttpMethod>() {
                Ok(method) => Strategy::select(step, method, response.transport),
                Err(e) => {
                    warn!(step = %step.name, error = %e, "no strategy for method");
                    return StepOutcome::failed(step, "unsupported_method", e.to_string());
                }
            }
        };
        debug!(step = %step.name, strategy = %strategy, "selected validation strategy");

        let outcome = match strategy {
            Strategy::Method { method, checks } => self.run_checks(step, response, strategy, method, checks),
            Strategy::GetCompareWithPut => self.compare_with_put(step, response, strategy),
            Strategy::KubectlPattern => self.kubectl_pattern(step, response),
        };
        debug!(
            step = %step.name,
            strategy = %outcome.strategy,
            passed = outcome.passed,
            reason = %outcome.reason,
            "step validated"
        );
        outcome
    }

    /// Run steps in order, carrying PUT payloads to later GETs.
    pub fn run_workflow<'a, I>(&self, cases: I) -> Vec<StepOutcome>
    where
        I: IntoIterator<Item = (&'a TestStep, &'a StepResponse)>,
    {
        let mut workflow = Workflow::new();
        cases
            .into_iter()
            .map(|(step, response)| {
                let prepared = workflow.prepare(step);
                let outcome = self.run(&prepared, response);
                workflow.record(&prepared, &outcome);
                outcome
            })
            .collect()
    }

    // ── strategies ──

    fn run_checks(
        &self,
        step: &TestStep,
        response: &StepResponse,
        strategy: Strategy,
        method: HttpMethod,
        checks: Checks,
    ) -> StepOutcome {
        let name = strategy.name();
        let actual = response.resolved_status();
        let status_note = match check_status(method, step.expected_status, actual) {
            Ok(note) => note,
            Err(reason) => return StepOutcome::failed(step, &name, reason),
        };

        let pattern = if checks.uses_pattern() { step.pattern() } else { None };
        let payload = if checks.uses_payload() {
            step.response_payload.as_ref()
        } else {
            None
        };
        let verdict = self
            .validator
            .validate(pattern, response.headers.as_ref(), &response.body, payload);
        self.finish(step, name, status_note, verdict, Vec::new())
    }

    fn compare_with_put(&self, step: &TestStep, response: &StepResponse, strategy: Strategy) -> StepOutcome {
        let name = strategy.name();
        let actual = response.resolved_status();
        let status_note = match check_status(HttpMethod::Get, step.expected_status, actual) {
            Ok(note) => note,
            Err(reason) => return StepOutcome::failed(step, &name, reason),
        };
        let verdict = self.validator.validate(
            step.pattern(),
            response.headers.as_ref(),
            &response.body,
            step.saved_payload.as_ref(),
        );
        let notes = vec!["compared against payload saved from earlier PUT".to_string()];
        self.finish(step, name, status_note, verdict, notes)
    }

    fn kubectl_pattern(&self, step: &TestStep, response: &StepResponse) -> StepOutcome {
        let name = Strategy::KubectlPattern.name();
        let Some(pattern) = step.pattern() else {
            return StepOutcome::failed(step, &name, "pattern is missing");
        };
        let mut notes = Vec::new();

        let mut status_note = "no status check".to_string();
        if let Some(expected) = step.expected_status {
            match response.resolved_status() {
                Some(actual) if expected.matches(actual) => {
                    status_note = format!("status {actual} matches {expected}");
                }
                Some(actual) => {
                    return StepOutcome::failed(
                        step,
                        &name,
                        format!("status mismatch: expected {expected}, actual {actual}"),
                    );
                }
                None => notes.push("transcript carries no status; status check skipped".to_string()),
            }
        }

        let headers = response.headers.as_ref();
        let line_match = response
            .body
            .raw()
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .find_map(|(idx, line)| {
                let report = match_pattern(pattern, &Body::from_text(line), headers);
                report.matched.then_some((idx + 1, report))
            });
        let report = match line_match {
            Some((line_no, report)) => {
                notes.push(format!("pattern matched on line {line_no}"));
                report
            }
            None => match_pattern(pattern, &response.body, headers),
        };

        let mut verdict = if step.has_payload() {
            self.validator
                .validate(None, headers, &response.body, step.response_payload.as_ref())
        } else {
            Verdict::skipped()
        };
        verdict.set_pattern(report.matched, report.attempts);
        self.finish(step, name, status_note, verdict, notes)
    }

    fn finish(
        &self,
        step: &TestStep,
        strategy: String,
        status_note: String,
        verdict: Verdict,
        mut notes: Vec<String>,
    ) -> StepOutcome {
        if let Some(pct) = verdict.match_percentage {
            if pct < self.config.json_match_threshold {
                notes.push(format!(
                    "structural match {pct:.2}% is below the configured threshold {:.2}%",
                    self.config.json_match_threshold
                ));
            }
        }
        let reason = if verdict.is_skipped() {
            status_note
        } else {
            verdict.summary.clone()
        };
        StepOutcome {
            step: step.name.clone(),
            strategy,
            passed: !verdict.has_failure(),
            reason,
            verdict: Some(verdict),
            notes,
        }
    }
}

/// Status check shared by every HTTP strategy.
///
/// Missing inputs fail with a reason. PUT treats 200 and 201 as
/// interchangeable when either is expected.
fn check_status(method: HttpMethod, expected: Option<StatusExpectation>, actual: Option<u16>) -> Result<String, String> {
    let Some(expected) = expected else {
        warn!("status check required but no expected status declared");
        return Err("expected status is missing".to_string());
    };
    let Some(actual) = actual else {
        warn!(%expected, "status check required but response carries no status");
        return Err("actual status is missing".to_string());
    };

    let put_success = method == HttpMethod::Put
        && (expected.is_exact(200) || expected.is_exact(201))
        && matches!(actual, 200 | 201);
    if put_success || expected.matches(actual) {
        Ok(format!("status {actual} matches {expected}"))
    } else {
        Err(format!("status mismatch: expected {expected}, actual {actual}"))
    }
}
