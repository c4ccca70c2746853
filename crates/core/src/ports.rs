//! Port interfaces implemented by infrastructure adapters

use async_trait::async_trait;
use adpulse_domain::{
    CreateReportResponse, CredentialSet, PrincipalId, RefreshedToken, RemoteFailure,
    RemoteReportStatus, ReportJobSpec, TokenSlot,
};

/// Exchanges a refresh token for a fresh access token.
///
/// Injected once into the refresh coordinator; implementations talk to the
/// token endpoint of the slot's API family and report failures raw.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Mint a new access token for `slot` from `refresh_token`.
    async fn refresh(
        &self,
        principal: &PrincipalId,
        slot: TokenSlot,
        refresh_token: &str,
    ) -> Result<RefreshedToken, RemoteFailure>;
}

/// Remote asynchronous reporting API (create → status → download).
#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// Submit a report request; returns the remote report id.
    async fn create_report(
        &self,
        credentials: &CredentialSet,
        spec: &ReportJobSpec,
    ) -> Result<CreateReportResponse, RemoteFailure>;

    /// Fetch the current status of a report.
    async fn report_status(
        &self,
        credentials: &CredentialSet,
        profile_id: &str,
        report_id: &str,
    ) -> Result<RemoteReportStatus, RemoteFailure>;

    /// Download the raw (still gzip-encoded) report body.
    async fn download_report(
        &self,
        credentials: &CredentialSet,
        location: &str,
    ) -> Result<Vec<u8>, RemoteFailure>;
}
