//! Validation configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::validator::{DICT_MATCH_THRESHOLD, ValidationOptions};

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Object keys ignored at every depth (timestamps, request ids, ...)
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    /// Extra fields in the response are permitted (default: true)
    #[serde(default = "default_true")]
    pub partial_dict_match: bool,

    /// Arrays compare regardless of element order (default: true)
    #[serde(default = "default_true")]
    pub ignore_array_order: bool,

    /// Advisory structural match threshold in percent (default: 50).
    /// Outcomes below it carry a note; the pass rule itself does not change.
    #[serde(default = "default_threshold")]
    pub json_match_threshold: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_threshold() -> f64 {
    DICT_MATCH_THRESHOLD
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ignore_fields: Vec::new(),
            partial_dict_match: true,
            ignore_array_order: true,
            json_match_threshold: DICT_MATCH_THRESHOLD,
        }
    }
}

impl ValidationConfig {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the first default location that exists, else defaults
    ///
    /// # Errors
    ///
    /// Returns error if a candidate exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Like [`Self::load_default`], relative to `dir`
    ///
    /// # Errors
    ///
    /// Returns error if a candidate exists but cannot be read or parsed
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [".respcheck.toml", ".respcheck.json", "respcheck.toml"];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.json_match_threshold) {
            return Err(ConfigError::Invalid(format!(
                "json_match_threshold must be within 0-100, got {}",
                self.json_match_threshold
            )));
        }
        Ok(())
    }

    /// Options consumed by the response validator
    #[must_use]
    pub fn options(&self) -> ValidationOptions {
        ValidationOptions {
            ignore_fields: self.ignore_fields.clone(),
            partial_dict_match: self.partial_dict_match,
            ignore_array_order: self.ignore_array_order,
        }
    }

    /// Create example config file
    #[must_use]
    pub const fn example() -> &'static str {
        r#"# respcheck configuration

# Keys removed from both expected and actual payloads before comparing
ignore_fields = ["timestamp", "requestId"]

# Allow extra fields in responses (default: true)
partial_dict_match = true

# Compare arrays regardless of element order (default: true)
ignore_array_order = true

# Advisory structural match threshold in percent (default: 50)
# Steps scoring below it get a note; a payload still passes above 50%.
# json_match_threshold = 80.0
"#
    }
}

impl From<&ValidationConfig> for ValidationOptions {
    fn from(config: &ValidationConfig) -> Self {
        config.options()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
