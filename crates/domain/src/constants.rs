//! Domain constants
//!
//! Defaults mirror the remote platform's observed behaviour: access tokens
//! live roughly an hour, reports take minutes to build.

/// Refresh cached access tokens once they are older than this (55 minutes).
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 55 * 60;

/// Fixed sleep between report status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Rows transformed per slice before yielding to the scheduler.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Per-request timeout for reporting API calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header carrying the OAuth client id on reporting API calls.
pub const DEFAULT_CLIENT_ID_HEADER: &str = "Amazon-Advertising-API-ClientId";

/// Header carrying the advertiser profile on reporting API calls.
pub const DEFAULT_SCOPE_HEADER: &str = "Amazon-Advertising-API-Scope";

/// Media type for the asynchronous create-report request body.
pub const CREATE_REPORT_CONTENT_TYPE: &str = "application/vnd.createasyncreportrequest.v3+json";

/// Report format requested from the platform.
pub const REPORT_FORMAT_GZIP_JSON: &str = "GZIP_JSON";
