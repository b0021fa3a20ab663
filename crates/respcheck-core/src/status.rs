//! Expected status codes and transcript status extraction
//!
//! A step's expected status is an exact code (`200`), a class wildcard
//! (`4XX`) or an inclusive range (`400-404`). Spreadsheet sources often hand
//! codes over as floats, so `200.0` is accepted as `200`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static STATUS_MARKER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"HTTP_STATUS:\s*(\d{3})").ok());
static STATUS_LINE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"HTTP/\d(?:\.\d)?\s+(\d{3})").ok());

/// An expected HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatusRepr", into = "StatusRepr")]
pub enum StatusExpectation {
    /// Exactly this code
    Exact(u16),
    /// Any code in the hundred, e.g. `4` for `4XX`
    Class(u8),
    /// Inclusive range
    Range { min: u16, max: u16 },
}

impl StatusExpectation {
    /// Whether `actual` satisfies this expectation.
    #[must_use]
    pub const fn matches(self, actual: u16) -> bool {
        match self {
            Self::Exact(code) => code == actual,
            Self::Class(class) => actual / 100 == class as u16,
            Self::Range { min, max } => min <= actual && actual <= max,
        }
    }

    /// Whether this expectation names exactly `code`.
    #[must_use]
    pub const fn is_exact(self, code: u16) -> bool {
        matches!(self, Self::Exact(c) if c == code)
    }
}

impl std::fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{code}"),
            Self::Class(class) => write!(f, "{class}XX"),
            Self::Range { min, max } => write!(f, "{min}-{max}"),
        }
    }
}

impl From<u16> for StatusExpectation {
    fn from(code: u16) -> Self {
        Self::Exact(code)
    }
}

/// Error parsing a status expectation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusParseError {
    #[error("empty status expectation")]
    Empty,
    #[error("invalid status expectation '{0}'")]
    Invalid(String),
    #[error("status range {min}-{max} has min greater than max")]
    InvertedRange { min: u16, max: u16 },
}

impl FromStr for StatusExpectation {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(StatusParseError::Empty);
        }
        let invalid = || StatusParseError::Invalid(text.to_string());

        if text.len() == 3 && text.is_ascii() && text[1..].eq_ignore_ascii_case("xx") {
            return text[..1]
                .parse::<u8>()
                .ok()
                .filter(|class| (1..=5).contains(class))
                .map(Self::Class)
                .ok_or_else(invalid);
        }

        if let Some((lo, hi)) = text.split_once('-') {
            let min = parse_code(lo).ok_or_else(invalid)?;
            let max = parse_code(hi).ok_or_else(invalid)?;
            if min > max {
                return Err(StatusParseError::InvertedRange { min, max });
            }
            return Ok(Self::Range { min, max });
        }

        parse_code(text).map(Self::Exact).ok_or_else(invalid)
    }
}

/// `404` or `404.0`
fn parse_code(text: &str) -> Option<u16> {
    let text = text.trim();
    if let Ok(code) = text.parse::<u16>() {
        return Some(code);
    }
    let float = text.parse::<f64>().ok()?;
    float_code(float)
}

fn float_code(value: f64) -> Option<u16> {
    if value.fract() != 0.0 || !(0.0..=f64::from(u16::MAX)).contains(&value) {
        return None;
    }
    // Range and integrality checked above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value as u16)
}

/// Wire form: a bare number or a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Code(u64),
    Float(f64),
    Text(String),
}

impl TryFrom<StatusRepr> for StatusExpectation {
    type Error = StatusParseError;

    fn try_from(repr: StatusRepr) -> Result<Self, Self::Error> {
        match repr {
            StatusRepr::Code(code) => u16::try_from(code)
                .map(Self::Exact)
                .map_err(|_| StatusParseError::Invalid(code.to_string())),
            StatusRepr::Float(value) => float_code(value)
                .map(Self::Exact)
                .ok_or_else(|| StatusParseError::Invalid(value.to_string())),
            StatusRepr::Text(text) => text.parse(),
        }
    }
}

impl From<StatusExpectation> for StatusRepr {
    fn from(expectation: StatusExpectation) -> Self {
        match expectation {
            StatusExpectation::Exact(code) => Self::Code(u64::from(code)),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Whether `actual` satisfies the textual expectation `expected`.
///
/// Unparseable expectations never match.
#[must_use]
pub fn status_matches(expected: &str, actual: u16) -> bool {
    expected
        .parse::<StatusExpectation>()
        .is_ok_and(|e| e.matches(actual))
}

/// Pull the final HTTP status out of a curl/kubectl transcript.
///
/// A `HTTP_STATUS:201` marker (curl `-w`) wins over status lines; among
/// status lines the last one is taken so redirects report the final hop.
#[must_use]
pub fn extract_status(transcript: &str) -> Option<u16> {
    let last_capture = |re: Option<&Regex>| {
        re?.captures_iter(transcript)
            .last()
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok())
    };
    last_capture(STATUS_MARKER_RE.as_ref()).or_else(|| last_capture(STATUS_LINE_RE.as_ref()))
}
