//! # Remote Failure Classification
//!
//! Calls against the remote list storage fail in ways that are useless to show
//! a user as-is: a bare status code, or no response at all when the connection
//! never got established. This module turns those into one stable message
//! format:
//!
//! ```text
//! <reason>: (<numeric status>) <symbolic name>
//! ```
//!
//! e.g. `not found: (404) NotFound`. Consumers parse this string, so the
//! format must not drift.
//!
//! ## Diagnostic Header
//!
//! The storage backend often embeds a structured reason in a non-standard
//! header ([`DIAGNOSTICS_HEADER`]) as semicolon-separated `key=value` pairs:
//!
//! ```text
//! x-ms-diagnostics: 3000003;reason="Invalid audience Uri";category="invalid_client"
//! ```
//!
//! [`extract_diagnostic_reason`] pulls out the `reason` value, and
//! [`describe_failure`] lets it override the canned per-status reason.
//!
//! Nothing here returns an error. Missing information degrades to the empty
//! string or to the generic classification.

use http::{HeaderMap, StatusCode};
use thiserror::Error;

pub const DIAGNOSTICS_HEADER: &str = "x-ms-diagnostics";

/// Typed outcome of a failed remote call, keyed on the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    NotFound,
    Internal,
    Generic,
}

impl FailureKind {
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => FailureKind::Unauthorized,
            404 => FailureKind::NotFound,
            500 => FailureKind::Internal,
            _ => FailureKind::Generic,
        }
    }

    /// Canned user-facing reason.
    pub fn reason(self) -> &'static str {
        match self {
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::NotFound => "not found",
            FailureKind::Internal => "internal error",
            FailureKind::Generic => "generic error",
        }
    }
}

/// The response half of a failed remote call.
#[derive(Debug, Clone)]
pub struct FailureResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl FailureResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// A failed call to the remote list storage.
///
/// `response` is `None` for connection-level failures (DNS, refused, reset).
#[derive(Error, Debug, Clone)]
#[error("remote call failed: {message}")]
pub struct RemoteFailure {
    pub message: String,
    pub response: Option<FailureResponse>,
}

impl RemoteFailure {
    pub fn without_response(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    pub fn with_response(message: impl Into<String>, response: FailureResponse) -> Self {
        Self {
            message: message.into(),
            response: Some(response),
        }
    }

    pub fn kind(&self) -> FailureKind {
        FailureKind::from_status(self.status_code())
    }

    /// Status code of the response, or 500 when there was none.
    pub fn status_code(&self) -> u16 {
        self.response
            .as_ref()
            .map(|r| r.status.as_u16())
            .unwrap_or(500)
    }
}

/// PascalCase form of the canonical reason phrase, e.g. `NotFound`.
///
/// Codes without a canonical phrase are named by their number.
pub fn symbolic_name(code: u16) -> String {
    let phrase = StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());

    let Some(phrase) = phrase else {
        return code.to_string();
    };

    phrase
        .split(|c: char| c.is_whitespace() || c == '-')
        .map(|word| {
            let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Formats a status as `"<reason>: (<code>) <name>"`.
///
/// A non-empty `explicit_reason` always wins over the canned reason.
pub fn classify_status(code: u16, explicit_reason: Option<&str>) -> String {
    let reason = match explicit_reason {
        Some(reason) if !reason.is_empty() => reason,
        _ => FailureKind::from_status(code).reason(),
    };
    format!("{}: ({}) {}", reason, code, symbolic_name(code))
}

/// Classifies a failure by status alone. No response counts as a 500.
pub fn classify_failure(failure: &RemoteFailure) -> String {
    classify_status(failure.status_code(), None)
}

/// Like [`classify_failure`], but a reason found in the diagnostic header
/// replaces the canned one.
pub fn describe_failure(failure: &RemoteFailure) -> String {
    let reason = extract_diagnostic_reason(failure);
    classify_status(failure.status_code(), Some(reason.as_str()))
}

/// Returns the last `reason=` value from the diagnostic header, unquoted.
pub fn extract_diagnostic_reason(failure: &RemoteFailure) -> String {
    let Some(response) = failure.response.as_ref() else {
        return String::new();
    };
    let Some(header) = response.headers.get(DIAGNOSTICS_HEADER) else {
        return String::new();
    };
    parse_diagnostic_reason(&String::from_utf8_lossy(header.as_bytes()))
}

fn parse_diagnostic_reason(header: &str) -> String {
    let mut reason = String::new();
    for pair in header.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key.trim() == "reason" {
            reason = value.trim().trim_matches('"').to_string();
        }
    }
    reason
}
