//! Wires the HTTP adapters into a [`ReportService`]

use std::sync::Arc;

use adpulse_common::{Clock, SystemClock};
use adpulse_core::{
    CredentialStore, RefreshCoordinator, ReportService, ReportServiceOptions, ReportingApi,
    TokenRefresher,
};
use adpulse_domain::{Config, Result};
use tracing::info;

use crate::integrations::ads::{OAuthTokenRefresher, ReportingClient};

/// Build a report service talking to the configured endpoints.
///
/// # Errors
/// Returns an error when an HTTP client cannot be constructed.
pub fn build_report_service(config: &Config) -> Result<ReportService> {
    let refresher: Arc<dyn TokenRefresher> = Arc::new(OAuthTokenRefresher::from_config(config)?);
    let api: Arc<dyn ReportingApi> =
        Arc::new(ReportingClient::new(&config.reporting, config.oauth.client_id.clone())?);

    let service = assemble(config, refresher, api, Arc::new(SystemClock));
    info!(base_url = %config.reporting.base_url, "report service ready");
    Ok(service)
}

/// Assemble a service from arbitrary ports.
pub fn assemble(
    config: &Config,
    refresher: Arc<dyn TokenRefresher>,
    api: Arc<dyn ReportingApi>,
    clock: Arc<dyn Clock>,
) -> ReportService {
    let store = Arc::new(CredentialStore::new(Arc::clone(&clock)));
    let coordinator = Arc::new(RefreshCoordinator::new(
        store,
        refresher,
        config.credentials.refresh_threshold(),
    ));
    ReportService::new(coordinator, api, clock, ReportServiceOptions::from(&config.jobs))
}
