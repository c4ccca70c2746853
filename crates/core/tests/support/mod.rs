//! Shared fakes for `adpulse-core` integration tests.
//!
//! The refresher and reporting API here are scripted in memory so tests can
//! count network exchanges and replay exact remote responses.

#![allow(dead_code)]

pub mod api;
pub mod refresher;

use std::sync::Arc;
use std::time::Duration;

use adpulse_common::{Clock, MockClock};
use adpulse_core::{CredentialStore, PollOptions, RefreshCoordinator, ReportService, ReportServiceOptions};
use adpulse_domain::{
    CreateReportRequest, PrincipalId, RefreshTokens, ReportConfiguration, ReportJobSpec, TimeUnit,
};

pub use api::ScriptedReportingApi;
pub use refresher::CountingRefresher;

/// Matches the production default (55 minutes).
pub const THRESHOLD: Duration = Duration::from_secs(55 * 60);

pub fn principal() -> PrincipalId {
    PrincipalId::new("acct-42")
}

pub fn tokens() -> RefreshTokens {
    RefreshTokens::reporting("rt-reporting")
}

pub fn coordinator(refresher: Arc<CountingRefresher>, clock: &MockClock) -> Arc<RefreshCoordinator> {
    let clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let store = Arc::new(CredentialStore::new(clock));
    Arc::new(RefreshCoordinator::new(store, refresher, THRESHOLD))
}

/// Fast polling so job tests finish in milliseconds.
pub fn fast_poll() -> PollOptions {
    PollOptions { interval: Duration::from_millis(5), max_attempts: None, deadline: None }
}

pub fn service(
    api: Arc<ScriptedReportingApi>,
    refresher: Arc<CountingRefresher>,
    poll: PollOptions,
) -> ReportService {
    let clock = MockClock::new();
    let coordinator = coordinator(refresher, &clock);
    ReportService::new(coordinator, api, Arc::new(clock), ReportServiceOptions { poll, chunk_size: 2 })
}

pub fn job_spec() -> ReportJobSpec {
    ReportJobSpec {
        profile_id: "3211234".into(),
        request: CreateReportRequest {
            name: "SP campaigns".into(),
            start_date: "2024-05-01".into(),
            end_date: "2024-05-07".into(),
            configuration: ReportConfiguration {
                ad_product: "SPONSORED_PRODUCTS".into(),
                report_type_id: "spCampaigns".into(),
                format: "GZIP_JSON".into(),
                group_by: vec!["campaign".into()],
                columns: vec!["campaignId".into(), "impressions".into(), "clicks".into()],
                filters: Vec::new(),
                time_unit: TimeUnit::Summary,
            },
        },
    }
}
