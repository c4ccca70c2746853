//! # AdPulse Core
//!
//! Credential lifecycle and report orchestration - no HTTP or I/O.
//!
//! This crate contains:
//! - Failure classification, the credential cache and single-flight refresh
//! - The bounded auth-retry invoker
//! - The report job state machine and chunked row transformation
//! - Port interfaces implemented by `adpulse-infra`
//!
//! ## Architecture Principles
//! - Only depends on `adpulse-common` and `adpulse-domain`
//! - All remote access goes through the traits in [`ports`]
//! - Time comes from an injected [`adpulse_common::Clock`]

pub mod auth;
pub mod ports;
pub mod reporting;

pub use auth::{
    classify, ClassifiedError, CredentialStore, ErrorKind, RefreshCoordinator, RetryingInvoker,
};
pub use ports::{ReportingApi, TokenRefresher};
pub use reporting::{
    ChunkedTransformer, JobErrorKind, JobPhase, JobStatus, PollOptions, ReportData, ReportJob,
    ReportJobError, ReportJobRunner, ReportOutcome, ReportService, ReportServiceOptions,
};
