use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use adpulse_core::ReportingApi;
use adpulse_domain::{
    CreateReportResponse, CredentialSet, RemoteFailure, RemoteReportStatus, ReportJobSpec,
};

/// One recorded call: operation name and the bearer token it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub operation: &'static str,
    pub access_token: Option<String>,
}

/// Reporting API replaying queued responses.
///
/// Once the status queue is drained the last successful status repeats, so a
/// single `PENDING` scripts "pending forever".
#[derive(Default)]
pub struct ScriptedReportingApi {
    creates: Mutex<VecDeque<Result<CreateReportResponse, RemoteFailure>>>,
    statuses: Mutex<VecDeque<Result<RemoteReportStatus, RemoteFailure>>>,
    last_status: Mutex<Option<RemoteReportStatus>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>, RemoteFailure>>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl ScriptedReportingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create(&self, response: Result<CreateReportResponse, RemoteFailure>) -> &Self {
        self.creates.lock().unwrap().push_back(response);
        self
    }

    pub fn push_status(&self, response: Result<RemoteReportStatus, RemoteFailure>) -> &Self {
        self.statuses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_download(&self, response: Result<Vec<u8>, RemoteFailure>) -> &Self {
        self.downloads.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| call.operation == operation).count()
    }

    fn record(&self, operation: &'static str, credentials: &CredentialSet) {
        self.calls.lock().unwrap().push(ApiCall {
            operation,
            access_token: credentials.reporting_token().map(str::to_owned),
        });
    }
}

pub fn status(value: &str) -> Result<RemoteReportStatus, RemoteFailure> {
    Ok(RemoteReportStatus {
        report_id: Some("rep-1".into()),
        status: value.into(),
        url: None,
        failure_reason: None,
    })
}

pub fn completed(url: &str) -> Result<RemoteReportStatus, RemoteFailure> {
    Ok(RemoteReportStatus {
        report_id: Some("rep-1".into()),
        status: "COMPLETED".into(),
        url: Some(url.into()),
        failure_reason: None,
    })
}

#[async_trait]
impl ReportingApi for ScriptedReportingApi {
    async fn create_report(
        &self,
        credentials: &CredentialSet,
        _spec: &ReportJobSpec,
    ) -> Result<CreateReportResponse, RemoteFailure> {
        self.record("create", credentials);
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CreateReportResponse { report_id: "rep-1".into() }))
    }

    async fn report_status(
        &self,
        credentials: &CredentialSet,
        _profile_id: &str,
        _report_id: &str,
    ) -> Result<RemoteReportStatus, RemoteFailure> {
        self.record("status", credentials);
        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last_status.lock().unwrap() = Some(status.clone());
                Ok(status)
            }
            Some(Err(failure)) => Err(failure),
            None => self
                .last_status
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RemoteFailure::message("no scripted status")),
        }
    }

    async fn download_report(
        &self,
        credentials: &CredentialSet,
        _location: &str,
    ) -> Result<Vec<u8>, RemoteFailure> {
        self.record("download", credentials);
        self.downloads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteFailure::message("no scripted download")))
    }
}
