//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CLIENT_ID_HEADER, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCOPE_HEADER,
};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Token endpoint for the reporting slot.
    pub oauth: OAuthClientConfig,
    /// Token endpoint for the catalog (seller-data) slot. Falls back to
    /// `oauth` when absent.
    #[serde(default)]
    pub catalog_oauth: Option<OAuthClientConfig>,
    /// Reporting API endpoint.
    pub reporting: ReportingConfig,
    /// When cached access tokens count as stale.
    #[serde(default)]
    pub credentials: CredentialPolicyConfig,
    /// Report job polling and decoding.
    #[serde(default)]
    pub jobs: ReportJobConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OAuth client used to exchange refresh tokens for access tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthClientConfig {
    /// Endpoint receiving the refresh grant.
    pub token_url: String,
    /// OAuth client id.
    pub client_id: String,
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub client_secret: String,
}

/// Reporting API endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportingConfig {
    /// API root, without a trailing path.
    pub base_url: String,
    /// Header carrying the OAuth client id.
    #[serde(default = "default_client_id_header")]
    pub client_id_header: String,
    /// Header carrying the profile scope.
    #[serde(default = "default_scope_header")]
    pub scope_header: String,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Transport-level attempts per request (1 disables transport retries).
    #[serde(default = "default_http_max_attempts")]
    pub http_max_attempts: usize,
}

/// Credential freshness policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialPolicyConfig {
    /// Tokens older than this are refreshed before use.
    pub refresh_threshold_secs: u64,
}

/// Report job polling and decoding settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportJobConfig {
    /// Pause between status checks.
    pub poll_interval_secs: u64,
    /// Unbounded when absent.
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
    /// Unbounded when absent.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    /// Rows normalized per chunk.
    pub chunk_size: usize,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `adpulse_core=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// OAuth client for the catalog slot.
    pub fn catalog_oauth(&self) -> &OAuthClientConfig {
        self.catalog_oauth.as_ref().unwrap_or(&self.oauth)
    }
}

impl ReportingConfig {
    /// Endpoint with default headers and timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id_header: default_client_id_header(),
            scope_header: default_scope_header(),
            request_timeout_secs: default_request_timeout_secs(),
            http_max_attempts: default_http_max_attempts(),
        }
    }

    /// Per-request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl CredentialPolicyConfig {
    /// Refresh threshold as a `Duration`.
    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }
}

impl ReportJobConfig {
    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Overall deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Default for CredentialPolicyConfig {
    fn default() -> Self {
        Self { refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS }
    }
}

impl Default for ReportJobConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_poll_attempts: None,
            deadline_secs: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

fn default_client_id_header() -> String {
    DEFAULT_CLIENT_ID_HEADER.to_string()
}

fn default_scope_header() -> String {
    DEFAULT_SCOPE_HEADER.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_http_max_attempts() -> usize {
    1
}
