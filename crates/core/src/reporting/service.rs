//! Report service entry points

use std::future::Future;
use std::sync::Arc;

use adpulse_common::Clock;
use adpulse_domain::{
    CredentialSet, PrincipalId, RefreshTokens, RemoteFailure, ReportJobConfig, ReportJobSpec,
    ReportRow,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::chunked::ChunkedTransformer;
use super::decode::{decode_report_body, RowNormalizer};
use super::error::ReportJobError;
use super::job::ReportJob;
use super::runner::{DownloadedReport, PollOptions, ReportJobRunner};
use crate::auth::{ClassifiedError, RefreshCoordinator, RetryingInvoker};
use crate::ports::ReportingApi;

/// Tuning for [`ReportService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportServiceOptions {
    /// Poll cadence and bounds.
    pub poll: PollOptions,
    /// Rows normalized per chunk.
    pub chunk_size: usize,
}

impl Default for ReportServiceOptions {
    fn default() -> Self {
        Self::from(&ReportJobConfig::default())
    }
}

impl From<&ReportJobConfig> for ReportServiceOptions {
    fn from(config: &ReportJobConfig) -> Self {
        Self { poll: PollOptions::from(config), chunk_size: config.chunk_size }
    }
}

/// Rows of a completed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    /// Final job state.
    pub job: ReportJob,
    /// Normalized rows in download order.
    pub rows: Vec<ReportRow>,
}

/// Result envelope handed back to callers. Exactly one of `data` and `error`
/// is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    /// True when `data` is set.
    pub success: bool,
    /// Present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,
    /// Present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportJobError>,
}

impl ReportOutcome {
    /// Successful outcome.
    pub fn succeeded(data: ReportData) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Failed outcome.
    pub fn failed(error: ReportJobError) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }

    /// Back into a `Result`.
    pub fn into_result(self) -> Result<ReportData, ReportJobError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ReportJobError::decode("outcome carries neither data nor error")),
        }
    }
}

impl From<Result<ReportData, ReportJobError>> for ReportOutcome {
    fn from(result: Result<ReportData, ReportJobError>) -> Self {
        match result {
            Ok(data) => Self::succeeded(data),
            Err(error) => Self::failed(error),
        }
    }
}

/// Fetches reports end to end for a principal.
pub struct ReportService {
    invoker: Arc<RetryingInvoker>,
    runner: ReportJobRunner,
    transformer: ChunkedTransformer,
}

impl ReportService {
    /// Service sharing one invoker between the runner and ad hoc calls.
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        api: Arc<dyn ReportingApi>,
        clock: Arc<dyn Clock>,
        options: ReportServiceOptions,
    ) -> Self {
        let invoker = Arc::new(RetryingInvoker::new(coordinator));
        let runner = ReportJobRunner::new(Arc::clone(&invoker), api, clock, options.poll);
        Self { invoker, runner, transformer: ChunkedTransformer::new(options.chunk_size) }
    }

    /// The invoker every remote call goes through.
    pub fn invoker(&self) -> &Arc<RetryingInvoker> {
        &self.invoker
    }

    /// Create, poll, download and decode a report. Never panics or returns
    /// an error; failures are reported in the outcome.
    pub async fn run_report_job(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        spec: &ReportJobSpec,
    ) -> ReportOutcome {
        self.run_report_job_cancellable(principal, tokens, spec, &CancellationToken::new()).await
    }

    /// Like [`ReportService::run_report_job`], stopping early when `cancel`
    /// fires.
    pub async fn run_report_job_cancellable(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        spec: &ReportJobSpec,
        cancel: &CancellationToken,
    ) -> ReportOutcome {
        let outcome = self
            .run_report_job_with(principal, tokens, spec, cancel, |row| row)
            .await
            .map(|(job, rows)| ReportData { job, rows });

        match &outcome {
            Ok(data) => info!(principal = %principal, rows = data.rows.len(), "report job completed"),
            Err(error) => warn!(principal = %principal, error = %error, "report job failed"),
        }
        outcome.into()
    }

    /// Run a report job and map each normalized row through `transform`,
    /// in order and in cooperative slices.
    #[instrument(skip(self, tokens, spec, cancel, transform), fields(principal = %principal))]
    pub async fn run_report_job_with<U, F>(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        spec: &ReportJobSpec,
        cancel: &CancellationToken,
        mut transform: F,
    ) -> Result<(ReportJob, Vec<U>), ReportJobError>
    where
        U: Send,
        F: FnMut(ReportRow) -> U + Send,
    {
        let DownloadedReport { mut job, body } = self.runner.run(principal, tokens, spec, cancel).await?;

        let rows = match decode_report_body(&body) {
            Ok(rows) => rows,
            Err(error) => return Err(job.fail(error)),
        };
        let normalizer = RowNormalizer::new(spec.request.configuration.columns.iter().cloned());
        let transformed = self
            .transformer
            .transform(rows, |row| normalizer.normalize(row).map(&mut transform))
            .try_collect::<Vec<U>>()
            .await;

        match transformed {
            Ok(rows) => Ok((job, rows)),
            Err(error) => Err(job.fail(error)),
        }
    }

    /// Run one remote operation with valid credentials and the single auth
    /// retry, outside of any report job.
    pub async fn invoke_once<T, F, Fut>(
        &self,
        principal: &PrincipalId,
        tokens: &RefreshTokens,
        operation: F,
    ) -> Result<T, ClassifiedError>
    where
        F: Fn(CredentialSet) -> Fut,
        Fut: Future<Output = Result<T, RemoteFailure>>,
    {
        self.invoker.invoke(principal, tokens, operation).await
    }
}
