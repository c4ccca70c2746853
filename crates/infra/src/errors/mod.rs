//! Error conversions at the infrastructure boundary

pub mod conversions;

pub use conversions::{failure_from_response, InfraError, IntoRemoteFailure};
