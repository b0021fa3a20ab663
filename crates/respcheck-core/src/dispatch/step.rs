use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::{Body, Headers};
use crate::status::{StatusExpectation, extract_status};
use crate::validator::expected_payload;

/// HTTP methods the dispatcher has strategies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [Self; 5] = [Self::Get, Self::Put, Self::Post, Self::Patch, Self::Delete];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Lowercase form used in strategy names.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct MethodParseError(pub String);

impl FromStr for HttpMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| MethodParseError(trimmed.to_string()))
    }
}

/// How the response was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// A single HTTP exchange with one body
    #[default]
    Http,
    /// `kubectl exec` / pod logs: newline-delimited independent records
    Kubectl,
}

/// A test step's declared expectations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStep {
    pub name: String,
    pub method: String,
    #[serde(default)]
    pub expected_status: Option<StatusExpectation>,
    /// Expected structure, as JSON or a JSON string
    #[serde(default)]
    pub response_payload: Option<Value>,
    #[serde(default)]
    pub pattern_match: Option<String>,
    /// Payload saved from an earlier PUT in the same workflow
    #[serde(default)]
    pub saved_payload: Option<Value>,
    /// Request body sent with the step; a passing PUT saves it
    #[serde(default)]
    pub request_body: Option<Value>,
    /// Resource key linking a PUT to later GETs
    #[serde(default)]
    pub resource: Option<String>,
    /// Source sheet, for traceability only
    #[serde(default)]
    pub sheet: Option<String>,
    /// Source row, for traceability only
    #[serde(default)]
    pub row: Option<usize>,
}

impl TestStep {
    #[must_use]
    pub fn new(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<StatusExpectation>) -> Self {
        self.expected_status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.response_payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern_match = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_request_body(mut self, body: Value) -> Self {
        self.request_body = Some(body);
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// A usable structural expectation is present.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        expected_payload(self.response_payload.as_ref()).is_some()
    }

    /// A non-blank pattern is present.
    #[must_use]
    pub fn has_pattern(&self) -> bool {
        self.pattern().is_some()
    }

    /// The pattern, if non-blank.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern_match.as_deref().filter(|p| !p.trim().is_empty())
    }

    #[must_use]
    pub fn has_saved_payload(&self) -> bool {
        expected_payload(self.saved_payload.as_ref()).is_some()
    }
}

/// What came back for a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[serde(default)]
    pub transport: Transport,
}

impl StepResponse {
    #[must_use]
    pub fn http(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
            headers: None,
            transport: Transport::Http,
        }
    }

    #[must_use]
    pub fn kubectl(transcript: &str) -> Self {
        Self {
            status: None,
            body: Body::from_text(transcript),
            headers: None,
            transport: Transport::Kubectl,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Observed status: the recorded one, else for kubectl the one the
    /// transcript reports.
    #[must_use]
    pub fn resolved_status(&self) -> Option<u16> {
        self.status.or_else(|| match self.transport {
            Transport::Kubectl => extract_status(self.body.raw()),
            Transport::Http => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolved_status_reads_kubectl_transcripts_only() {
        let transcript = "< HTTP/1.1 404 Not Found\n{}";
        assert_eq!(StepResponse::kubectl(transcript).resolved_status(), Some(404));
        assert_eq!(StepResponse::kubectl("no status here").resolved_status(), None);

        let http = StepResponse {
            status: None,
            ..StepResponse::http(200, transcript)
        };
        assert_eq!(http.resolved_status(), None);

        let recorded = StepResponse {
            status: Some(201),
            ..StepResponse::kubectl(transcript)
        };
        assert_eq!(recorded.resolved_status(), Some(201));
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!(" Patch ".parse::<HttpMethod>(), Ok(HttpMethod::Patch));
        assert_eq!(
            "OPTIONS".parse::<HttpMethod>(),
            Err(MethodParseError("OPTIONS".into()))
        );
    }

    #[test]
    fn presence_flags_ignore_blank_values() {
        let step = TestStep {
            response_payload: Some(json!("")),
            pattern_match: Some("  ".into()),
            saved_payload: Some(Value::Null),
            ..TestStep::new("s", "GET")
        };
        assert!(!step.has_payload());
        assert!(!step.has_pattern());
        assert!(!step.has_saved_payload());
    }

    #[test]
    fn step_deserializes_from_sheet_style_json() {
        let step: TestStep = serde_json::from_value(json!({
            "name": "get user",
            "method": "get",
            "expected_status": 200.0,
            "response_payload": "{\"id\": 1}",
            "sheet": "Users",
            "row": 4
        }))
        .unwrap();
        assert_eq!(step.expected_status, Some(StatusExpectation::Exact(200)));
        assert!(step.has_payload());
        assert_eq!(step.row, Some(4));
    }

    #[test]
    fn response_body_accepts_json_or_text() {
        let r: StepResponse = serde_json::from_value(json!({"status": 200, "body": {"id": 1}})).unwrap();
        assert!(r.body.is_json());
        let r: StepResponse =
            serde_json::from_value(json!({"body": "line one\nline two", "transport": "kubectl"})).unwrap();
        assert_eq!(r.transport, Transport::Kubectl);
        assert!(!r.body.is_json());
    }
}
