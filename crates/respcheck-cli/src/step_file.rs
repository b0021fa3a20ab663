//! Step files: test steps with their observed responses, plus audit inputs
//!
//! Format follows the extension: `.json`, `.yaml`/`.yml`, anything else TOML.

use std::path::{Path, PathBuf};

use respcheck_core::{AuditInput, StepResponse, TestStep};
use serde::{Deserialize, Serialize};

/// One step and the response captured for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCase {
    #[serde(flatten)]
    pub step: TestStep,
    #[serde(default)]
    pub response: StepResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepFile {
    #[serde(default)]
    pub steps: Vec<StepCase>,
    #[serde(default)]
    pub audits: Vec<AuditInput>,
}

#[derive(Debug, thiserror::Error)]
pub enum StepFileError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, String),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, String),
}

impl StepFile {
    /// # Errors
    ///
    /// Returns error if the file cannot be read or does not parse
    pub fn load(path: &Path) -> Result<Self, StepFileError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StepFileError::Io(path.to_path_buf(), e.to_string()))?;
        let parse_err = |e: &dyn std::fmt::Display| StepFileError::Parse(path.to_path_buf(), e.to_string());

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(&e)),
            Some("yaml" | "yml") => serde_yml::from_str(&content).map_err(|e| parse_err(&e)),
            _ => toml::from_str(&content).map_err(|e| parse_err(&e)),
        }
    }

    /// Borrowed `(step, response)` pairs in file order.
    pub fn cases(&self) -> impl Iterator<Item = (&TestStep, &StepResponse)> {
        self.steps.iter().map(|case| (&case.step, &case.response))
    }
}
