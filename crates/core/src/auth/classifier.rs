//! Failure classification
//!
//! Every failed remote call is sorted into exactly one [`ErrorKind`] here and
//! nowhere else. The inputs are untrusted: bodies may be any JSON shape, so
//! extraction only ever uses fallible accessors and unknown shapes degrade to
//! [`ErrorKind::Unclassified`].

use std::fmt;

use adpulse_domain::RemoteFailure;
use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Category of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Access token rejected; one refresh-and-retry may help.
    AuthExpired,
    /// HTTP 429. Left to an outer backoff policy.
    RateLimited,
    /// No response received (reset, timeout, refused).
    TransientNetwork,
    /// The refresh token itself is dead; only the account owner can fix it.
    PermanentInvalidCredential,
    /// Anything else, including bodies of unknown shape.
    Unclassified,
}

impl ErrorKind {
    /// Wire name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::RateLimited => "RATE_LIMITED",
            Self::TransientNetwork => "TRANSIENT_NETWORK",
            Self::PermanentInvalidCredential => "PERMANENT_INVALID_CREDENTIAL",
            Self::Unclassified => "UNCLASSIFIED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote failure together with its category.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {cause}")]
pub struct ClassifiedError {
    /// Category assigned by [`classify`].
    pub kind: ErrorKind,
    /// The failure as received.
    pub cause: RemoteFailure,
}

impl ClassifiedError {
    /// Pair a failure with an already known category.
    pub fn new(kind: ErrorKind, cause: RemoteFailure) -> Self {
        Self { kind, cause }
    }

    /// True when a single refresh-and-retry is worth attempting.
    pub fn is_auth_expired(&self) -> bool {
        self.kind == ErrorKind::AuthExpired
    }
}

impl From<RemoteFailure> for ClassifiedError {
    fn from(cause: RemoteFailure) -> Self {
        classify(cause)
    }
}

static PERMANENT_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)invalid_grant",
        r"(?i)refresh[ _-]?token\b.*\b(invalid|expired|revoked)",
        r"(?i)(invalid|expired|revoked)\b.*\brefresh[ _-]?token",
    ])
    .expect("PERMANENT_PATTERNS should compile - this is a bug")
});

static AUTH_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)unauthori[sz]ed",
        r"(?i)invalid[ _]token",
        r"(?i)token[ _](has[ _])?expired",
        r"(?i)access denied",
        r"(?i)access to requested resource is denied",
        r"(?i)authenticating\b.*\btoken",
    ])
    .expect("AUTH_PATTERNS should compile - this is a bug")
});

static NETWORK_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)econnreset",
        r"(?i)econnrefused",
        r"(?i)etimedout",
        r"(?i)econnaborted",
        r"(?i)enotfound",
        r"(?i)eai_again",
        r"(?i)socket hang up",
        r"(?i)connection (reset|refused|closed|aborted)",
        r"(?i)timed? ?out",
    ])
    .expect("NETWORK_PATTERNS should compile - this is a bug")
});

/// Classify a failure, keeping it as the cause.
pub fn classify(failure: RemoteFailure) -> ClassifiedError {
    let kind = classify_kind(&failure);
    ClassifiedError { kind, cause: failure }
}

/// Decide the category of a failure without consuming it.
pub fn classify_kind(failure: &RemoteFailure) -> ErrorKind {
    let texts = failure_texts(failure);
    let any_match = |set: &RegexSet| texts.iter().any(|text| set.is_match(text));

    if any_match(&PERMANENT_PATTERNS) {
        return ErrorKind::PermanentInvalidCredential;
    }
    if failure.status == Some(401) || any_match(&AUTH_PATTERNS) {
        return ErrorKind::AuthExpired;
    }
    if failure.status == Some(429) {
        return ErrorKind::RateLimited;
    }
    if failure.status.is_none()
        && (failure.transport.is_some() || any_match(&NETWORK_PATTERNS))
    {
        return ErrorKind::TransientNetwork;
    }
    ErrorKind::Unclassified
}

/// Every human/machine readable string a failure carries: the message, plus
/// `errors[].code|message|details` and the usual top-level OAuth/API fields.
fn failure_texts(failure: &RemoteFailure) -> Vec<&str> {
    let mut texts = vec![failure.message.as_str()];
    if let Some(body) = &failure.body {
        collect_body_texts(body, &mut texts);
    }
    texts
}

fn collect_body_texts<'a>(body: &'a Value, out: &mut Vec<&'a str>) {
    const FIELDS: [&str; 6] = ["code", "message", "details", "error", "error_description", "Message"];

    match body {
        Value::String(text) => out.push(text),
        Value::Object(map) => {
            for field in FIELDS {
                match map.get(field) {
                    Some(Value::String(text)) => out.push(text),
                    // `{"error": {"code": ..., "message": ...}}`
                    Some(nested @ Value::Object(_)) => collect_body_texts(nested, out),
                    _ => {}
                }
            }
            if let Some(Value::Array(errors)) = map.get("errors") {
                for entry in errors {
                    collect_body_texts(entry, out);
                }
            }
        }
        _ => {}
    }
}
