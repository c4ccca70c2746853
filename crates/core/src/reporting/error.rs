//! Report job failure type

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{ClassifiedError, ErrorKind};

/// Stage of the report job in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    /// Submitting the report request.
    Create,
    /// Waiting for the remote status to settle.
    Poll,
    /// Fetching the finished report body.
    Download,
    /// Turning the body into rows.
    Decode,
}

impl JobPhase {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Poll => "poll",
            Self::Download => "download",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a job failed; the first five mirror [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobErrorKind {
    /// See [`ErrorKind::AuthExpired`].
    AuthExpired,
    /// See [`ErrorKind::RateLimited`].
    RateLimited,
    /// See [`ErrorKind::TransientNetwork`].
    TransientNetwork,
    /// See [`ErrorKind::PermanentInvalidCredential`].
    PermanentInvalidCredential,
    /// See [`ErrorKind::Unclassified`].
    Unclassified,
    /// The remote reported the report itself as failed.
    RemoteFailure,
    /// Status string outside the known vocabulary.
    UnknownReportStatus,
    /// Completed status arrived without a download URL.
    MissingDownloadLocation,
    /// Still pending after the allowed number of polls.
    PollLimitExceeded,
    /// Still pending when the overall deadline passed.
    DeadlineExceeded,
    /// Stopped by the caller.
    Cancelled,
    /// Body could not be turned into rows.
    Decode,
}

impl JobErrorKind {
    /// Wire name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::RateLimited => "RATE_LIMITED",
            Self::TransientNetwork => "TRANSIENT_NETWORK",
            Self::PermanentInvalidCredential => "PERMANENT_INVALID_CREDENTIAL",
            Self::Unclassified => "UNCLASSIFIED",
            Self::RemoteFailure => "REMOTE_FAILURE",
            Self::UnknownReportStatus => "UNKNOWN_REPORT_STATUS",
            Self::MissingDownloadLocation => "MISSING_DOWNLOAD_LOCATION",
            Self::PollLimitExceeded => "POLL_LIMIT_EXCEEDED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Cancelled => "CANCELLED",
            Self::Decode => "DECODE",
        }
    }
}

impl fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for JobErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::AuthExpired => Self::AuthExpired,
            ErrorKind::RateLimited => Self::RateLimited,
            ErrorKind::TransientNetwork => Self::TransientNetwork,
            ErrorKind::PermanentInvalidCredential => Self::PermanentInvalidCredential,
            ErrorKind::Unclassified => Self::Unclassified,
        }
    }
}

/// Why a report job ended in `FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("report job {phase} failed ({kind}): {message}")]
pub struct ReportJobError {
    /// Stage that failed.
    pub phase: JobPhase,
    /// Failure category.
    pub kind: JobErrorKind,
    /// Human-readable detail.
    pub message: String,
    /// Remote report id, once one was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

impl ReportJobError {
    /// Failure with no report id attached yet.
    pub fn new(phase: JobPhase, kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self { phase, kind, message: message.into(), report_id: None }
    }

    /// Failure carrying the category of a classified remote error.
    pub fn classified(phase: JobPhase, error: &ClassifiedError) -> Self {
        Self::new(phase, error.kind.into(), error.cause.to_string())
    }

    /// Payload could not be decoded.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(JobPhase::Decode, JobErrorKind::Decode, message)
    }

    /// The caller cancelled the job during `phase`.
    pub fn cancelled(phase: JobPhase) -> Self {
        Self::new(phase, JobErrorKind::Cancelled, "report job cancelled")
    }

    /// Attach `report_id` unless one is already set.
    pub fn with_report_id(mut self, report_id: Option<&str>) -> Self {
        if self.report_id.is_none() {
            self.report_id = report_id.map(str::to_owned);
        }
        self
    }
}
