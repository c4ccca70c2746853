//! Drives a [`ReportJob`] through create, poll and download

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use adpulse_common::Clock;
use adpulse_domain::{PrincipalId, RefreshTokens, ReportJobConfig, ReportJobSpec};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{JobErrorKind, JobPhase, ReportJobError};
use super::job::{PollDecision, ReportJob};
use crate::auth::{ClassifiedError, RetryingInvoker};
use crate::ports::ReportingApi;

/// Polling cadence and bounds. Both bounds are off by default, in which case
/// only the remote or a cancellation ends the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Pause between status checks.
    pub interval: Duration,
    /// Give up after this many pending statuses.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since creation.
    pub deadline: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from(&ReportJobConfig::default())
    }
}

impl From<&ReportJobConfig> for PollOptions {
    fn from(config: &ReportJobConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
            deadline: config.deadline(),
        }
    }
}

/// A completed job and its raw download body.
#[derive(Debug, Clone)]
pub struct DownloadedReport {
    /// Final job state.
    pub job: ReportJob,
    /// Body exactly as downloaded, possibly gzip-framed.
    pub body: Vec<u8>,
}

/// Runs report jobs; every remote call goes through the retrying invoker so
/// an expired token mid-poll is refreshed transparently.
pub struct ReportJobRunner {
    invoker: Arc<RetryingInvoker>,
    api: Arc<dyn ReportingApi>,
    clock: Arc<dyn Clock>,
    options: PollOptions,
}

impl ReportJobRunner {
    /// Runner with the given polling options.
    pub fn new(
        invoker: Arc<RetryingInvoker>,
        api: Arc<dyn ReportingApi>,
        clock: Arc<dyn Clock>,
        options: PollOptions,
    ) -> Self {
        Self { invoker, api, clock, options }
    }

    /// Polling options in effect.
    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Create, poll to a terminal state and download.
    #[instrument(
        skip(self, tokens, spec, cancel),
        fields(principal = %principal, profile_id = %spec.profile_id)
    )]
    pub async fn run(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        spec: &ReportJobSpec,
        cancel: &CancellationToken,
    ) -> Result<DownloadedReport, ReportJobError> {
        let mut job = ReportJob::new();
        self.create(&mut job, principal, tokens, spec, cancel).await?;
        let location = self.poll(&mut job, principal, tokens, spec, cancel).await?;
        let body = self.download(&mut job, principal, tokens, &location, cancel).await?;
        Ok(DownloadedReport { job, body })
    }

    /// Submit the report request. `CREATING → POLLING` on success.
    pub async fn create(
        &self,
        job: &mut ReportJob,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        spec: &ReportJobSpec,
        cancel: &CancellationToken,
    ) -> Result<(), ReportJobError> {
        let api = &self.api;
        let call = self.invoker.invoke(principal, tokens, |credentials| async move {
            api.create_report(&credentials, spec).await
        });
        let created = self.guarded(job, JobPhase::Create, cancel, call).await?;

        let now: DateTime<Utc> = self.clock.now().into();
        job.mark_created(created.report_id, now);
        info!(report_id = job.job_id().unwrap_or_default(), "report requested");
        Ok(())
    }

    /// Poll until the remote reaches a terminal state, returning the download
    /// location on completion.
    pub async fn poll(
        &self,
        job: &mut ReportJob,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        spec: &ReportJobSpec,
        cancel: &CancellationToken,
    ) -> Result<String, ReportJobError> {
        let report_id = job.job_id().unwrap_or_default().to_owned();
        let report_id = report_id.as_str();
        let started = Instant::now();
        let api = &self.api;
        let profile_id = spec.profile_id.as_str();

        loop {
            if let Some(deadline) = self.options.deadline {
                if started.elapsed() >= deadline {
                    return Err(job.fail(ReportJobError::new(
                        JobPhase::Poll,
                        JobErrorKind::DeadlineExceeded,
                        format!("report not ready after {}s", deadline.as_secs()),
                    )));
                }
            }

            let call = self.invoker.invoke(principal, tokens, |credentials| async move {
                api.report_status(&credentials, profile_id, report_id).await
            });
            let remote = self.guarded(job, JobPhase::Poll, cancel, call).await?;

            match job.observe(&remote) {
                PollDecision::Download(location) => {
                    info!(report_id, attempts = job.poll_attempt_count(), "report ready");
                    return Ok(location);
                }
                PollDecision::Failed(error) => {
                    warn!(report_id, error = %error, "report job failed");
                    return Err(error);
                }
                PollDecision::KeepPolling => {
                    debug!(
                        report_id,
                        status = %remote.status,
                        attempt = job.poll_attempt_count(),
                        "report not ready"
                    );
                }
            }

            if let Some(max) = self.options.max_attempts {
                if job.poll_attempt_count() >= max {
                    return Err(job.fail(ReportJobError::new(
                        JobPhase::Poll,
                        JobErrorKind::PollLimitExceeded,
                        format!("report still pending after {max} polls"),
                    )));
                }
            }

            let wait = match self.options.deadline {
                Some(deadline) => {
                    self.options.interval.min(deadline.saturating_sub(started.elapsed()))
                }
                None => self.options.interval,
            };
            tokio::select! {
                _ = cancel.cancelled() => return Err(job.fail(ReportJobError::cancelled(JobPhase::Poll))),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Fetch the report body from `location`.
    pub async fn download(
        &self,
        job: &mut ReportJob,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ReportJobError> {
        let api = &self.api;
        let call = self.invoker.invoke(principal, tokens, |credentials| async move {
            api.download_report(&credentials, location).await
        });
        let body = self.guarded(job, JobPhase::Download, cancel, call).await?;
        debug!(bytes = body.len(), "report downloaded");
        Ok(body)
    }

    /// Await a remote call unless the job is cancelled first; failures move
    /// the job to `FAILED`.
    async fn guarded<T>(
        &self,
        job: &mut ReportJob,
        phase: JobPhase,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, ClassifiedError>>,
    ) -> Result<T, ReportJobError> {
        if cancel.is_cancelled() {
            return Err(job.fail(ReportJobError::cancelled(phase)));
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(job.fail(ReportJobError::cancelled(phase))),
            outcome = call => outcome.map_err(|error| job.fail(ReportJobError::classified(phase, &error))),
        }
    }
}
