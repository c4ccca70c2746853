//! Report job state machine
//!
//! ```text
//! CREATING ──created──▶ POLLING ──COMPLETED + url──▶ COMPLETED
//!     │                  │  ▲
//!     │                  └──┘ PENDING / PROCESSING (attempt += 1, sleep)
//!     └──────────────────┴──▶ FAILED
//! ```
//!
//! Transitions only move forward; `COMPLETED` and `FAILED` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adpulse_domain::RemoteReportStatus;

use super::error::{JobErrorKind, JobPhase, ReportJobError};

/// Lifecycle state of a [`ReportJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Create request not yet acknowledged.
    Creating,
    /// Report accepted, waiting on the remote status.
    Polling,
    /// Report downloaded.
    Completed,
    /// Terminal failure; see [`ReportJob::failure`].
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// What a remote status string means for the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    /// `PENDING`, `PROCESSING`, `IN_PROGRESS`
    Pending,
    /// `COMPLETED`, `SUCCESS`
    Completed,
    /// `FAILED`, `FAILURE`, `CANCELLED`
    Failed,
}

impl RemoteState {
    /// Case-insensitive; `None` for anything outside the known vocabulary.
    pub fn parse(status: &str) -> Option<Self> {
        match status.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PROCESSING" | "IN_PROGRESS" => Some(Self::Pending),
            "COMPLETED" | "SUCCESS" => Some(Self::Completed),
            "FAILED" | "FAILURE" | "CANCELLED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Next step after observing a remote status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// Still pending; ask again after the poll interval.
    KeepPolling,
    /// Ready at the given location.
    Download(String),
    /// The job is over.
    Failed(ReportJobError),
}

/// Local view of one asynchronous report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJob {
    job_id: Option<String>,
    status: JobStatus,
    download_location: Option<String>,
    poll_attempt_count: u32,
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<ReportJobError>,
}

impl Default for ReportJob {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportJob {
    /// A job about to be created.
    pub fn new() -> Self {
        Self {
            job_id: None,
            status: JobStatus::Creating,
            download_location: None,
            poll_attempt_count: 0,
            created_at: None,
            failure: None,
        }
    }

    /// Remote report id, once created.
    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Current lifecycle state.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Where the finished report can be fetched.
    pub fn download_location(&self) -> Option<&str> {
        self.download_location.as_deref()
    }

    /// Number of non-terminal status responses seen so far.
    pub fn poll_attempt_count(&self) -> u32 {
        self.poll_attempt_count
    }

    /// When the remote accepted the create request.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Why the job failed, if it did.
    pub fn failure(&self) -> Option<&ReportJobError> {
        self.failure.as_ref()
    }

    /// `CREATING → POLLING` once the remote has accepted the request.
    pub fn mark_created(&mut self, report_id: impl Into<String>, at: DateTime<Utc>) {
        if self.status != JobStatus::Creating {
            return;
        }
        self.job_id = Some(report_id.into());
        self.created_at = Some(at);
        self.status = JobStatus::Polling;
    }

    /// Apply one status response while `POLLING`.
    pub fn observe(&mut self, remote: &RemoteReportStatus) -> PollDecision {
        if self.status != JobStatus::Polling {
            return match &self.failure {
                Some(failure) => PollDecision::Failed(failure.clone()),
                None => PollDecision::Failed(self.error(
                    JobErrorKind::UnknownReportStatus,
                    format!("job is {:?}, not polling", self.status),
                )),
            };
        }

        match RemoteState::parse(&remote.status) {
            Some(RemoteState::Pending) => {
                self.poll_attempt_count += 1;
                PollDecision::KeepPolling
            }
            Some(RemoteState::Completed) => {
                match remote.url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
                    Some(url) => {
                        self.download_location = Some(url.to_owned());
                        self.status = JobStatus::Completed;
                        PollDecision::Download(url.to_owned())
                    }
                    None => PollDecision::Failed(self.fail(self.error(
                        JobErrorKind::MissingDownloadLocation,
                        format!("report reached {} without a download url", remote.status),
                    ))),
                }
            }
            Some(RemoteState::Failed) => {
                let reason = remote
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| format!("report ended with status {}", remote.status));
                PollDecision::Failed(self.fail(self.error(JobErrorKind::RemoteFailure, reason)))
            }
            None => PollDecision::Failed(self.fail(self.error(
                JobErrorKind::UnknownReportStatus,
                format!("unrecognized report status {:?}", remote.status),
            ))),
        }
    }

    /// Move to `FAILED`, attaching the report id. Returns the stored error.
    pub fn fail(&mut self, error: ReportJobError) -> ReportJobError {
        let error = error.with_report_id(self.job_id.as_deref());
        self.status = JobStatus::Failed;
        self.failure = Some(error.clone());
        error
    }

    fn error(&self, kind: JobErrorKind, message: String) -> ReportJobError {
        ReportJobError::new(JobPhase::Poll, kind, message)
    }
}
