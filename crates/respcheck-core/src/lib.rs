//! respcheck-core: response validation engine for API test runners
//!
//! Judges whether a captured HTTP or kubectl response satisfies a test step's
//! expectations: structural comparison of JSON payloads, multi-strategy
//! pattern search, a per-method strategy dispatcher, and a strict audit mode
//! for compliance reporting.

pub mod audit;
pub mod compare;
pub mod config;
pub mod dispatch;
pub mod json;
pub mod pattern;
pub mod schema;
pub mod status;
pub mod subset;
pub mod validator;
pub mod verdict;

pub use audit::{
    AuditComparator, AuditError, AuditInput, AuditRecord, AuditResult, AuditSession, AuditSummary,
    ComplianceStatus,
};
pub use compare::{MatchResult, deep_compare, structure_and_values, structure_only, values_only};
pub use config::{ConfigError, ValidationConfig};
pub use dispatch::{Dispatcher, HttpMethod, StepOutcome, StepResponse, TestStep, Transport, Workflow};
pub use json::{Body, Headers};
pub use pattern::{MatchStrategy, PatternAttempt, PatternError, PatternReport, match_pattern};
pub use schema::{ValidationReport, generate_schema};
pub use status::{StatusExpectation, StatusParseError, extract_status, status_matches};
pub use subset::{deep_array_search, is_subset};
pub use validator::{ResponseValidator, ValidationOptions};
pub use verdict::{Difference, DifferenceKind, SummaryClass, Verdict};
