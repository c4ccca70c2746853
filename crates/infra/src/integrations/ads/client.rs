//! Reporting API client
//!
//! Implements [`ReportingApi`] over the v3 asynchronous reporting endpoints.
//! Every call returns a raw [`RemoteFailure`]; classification and the auth
//! retry happen in the core invoker.

use adpulse_core::ReportingApi;
use adpulse_domain::{
    AdPulseError, AdvertiserProfile, CreateReportResponse, CredentialSet, RemoteFailure,
    RemoteReportStatus, ReportJobSpec, ReportingConfig, CREATE_REPORT_CONTENT_TYPE,
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::errors::failure_from_response;
use crate::http::HttpClient;

/// Reporting API adapter: report lifecycle calls and profile listing.
pub struct ReportingClient {
    http: HttpClient,
    /// Pre-signed download URLs; bodies must stay compressed.
    download: HttpClient,
    base_url: String,
    client_id: String,
    client_id_header: String,
    scope_header: String,
}

impl ReportingClient {
    /// Client for `config`, identifying itself with `client_id`.
    pub fn new(config: &ReportingConfig, client_id: impl Into<String>) -> Result<Self, AdPulseError> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout())
            .max_attempts(config.http_max_attempts)
            .build()?;
        let download = HttpClient::builder()
            .timeout(config.request_timeout())
            .max_attempts(config.http_max_attempts)
            .without_decompression()
            .build()?;

        Ok(Self {
            http,
            download,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_id_header: config.client_id_header.clone(),
            scope_header: config.scope_header.clone(),
        })
    }

    /// Advertiser profiles visible to the principal's reporting token.
    #[instrument(skip(self, credentials), fields(principal = %credentials.principal_id))]
    pub async fn list_profiles(
        &self,
        credentials: &CredentialSet,
    ) -> Result<Vec<AdvertiserProfile>, RemoteFailure> {
        let request = self.authorized(Method::GET, "/v2/profiles", credentials)?;
        let profiles: Vec<AdvertiserProfile> = self.fetch_json(request).await?;
        debug!(count = profiles.len(), "profiles listed");
        Ok(profiles)
    }

    fn authorized(
        &self,
        method: Method,
        path: &str,
        credentials: &CredentialSet,
    ) -> Result<RequestBuilder, RemoteFailure> {
        let token = credentials.reporting_token().ok_or_else(|| {
            RemoteFailure::message(format!(
                "no reporting access token for principal {}",
                credentials.principal_id
            ))
        })?;

        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(self.client_id_header.as_str(), self.client_id.as_str()))
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteFailure> {
        let response = success(self.http.send(request).await?).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteFailure::message(format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl ReportingApi for ReportingClient {
    #[instrument(skip(self, credentials, spec), fields(principal = %credentials.principal_id, profile = %spec.profile_id))]
    async fn create_report(
        &self,
        credentials: &CredentialSet,
        spec: &ReportJobSpec,
    ) -> Result<CreateReportResponse, RemoteFailure> {
        let body = serde_json::to_vec(&spec.request)
            .map_err(|e| RemoteFailure::message(format!("failed to encode report request: {e}")))?;

        let request = self
            .authorized(Method::POST, "/reporting/reports", credentials)?
            .header(self.scope_header.as_str(), spec.profile_id.as_str())
            .header(CONTENT_TYPE, CREATE_REPORT_CONTENT_TYPE)
            .header(ACCEPT, CREATE_REPORT_CONTENT_TYPE)
            .body(body);

        let created: CreateReportResponse = self.fetch_json(request).await?;
        debug!(report_id = %created.report_id, "report requested");
        Ok(created)
    }

    #[instrument(skip(self, credentials), fields(principal = %credentials.principal_id))]
    async fn report_status(
        &self,
        credentials: &CredentialSet,
        profile_id: &str,
        report_id: &str,
    ) -> Result<RemoteReportStatus, RemoteFailure> {
        let request = self
            .authorized(Method::GET, &format!("/reporting/reports/{report_id}"), credentials)?
            .header(self.scope_header.as_str(), profile_id);

        self.fetch_json(request).await
    }

    #[instrument(skip_all, fields(principal = %credentials.principal_id))]
    async fn download_report(
        &self,
        credentials: &CredentialSet,
        location: &str,
    ) -> Result<Vec<u8>, RemoteFailure> {
        // Pre-signed URL: an Authorization header would be rejected by the
        // storage host.
        let request = self.download.request(Method::GET, location);
        let response = success(self.download.send(request).await?).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteFailure::message(format!("failed to read report body: {e}")))?;

        debug!(bytes = bytes.len(), "report downloaded");
        Ok(bytes.to_vec())
    }
}

async fn success(response: Response) -> Result<Response, RemoteFailure> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(failure_from_response(response).await)
    }
}
