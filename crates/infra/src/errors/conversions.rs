//! Conversions from external infrastructure errors into domain errors.

use std::error::Error as StdError;
use std::io;

use adpulse_domain::{AdPulseError, RemoteFailure, TransportFault};
use reqwest::Error as HttpError;
use reqwest::Response;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AdPulseError);

impl From<InfraError> for AdPulseError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AdPulseError> for InfraError {
    fn from(value: AdPulseError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
pub trait IntoRemoteFailure {
    /// Describe `self` as a failed remote call.
    fn into_remote_failure(self) -> RemoteFailure;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RemoteFailure */
/* -------------------------------------------------------------------------- */

impl IntoRemoteFailure for HttpError {
    fn into_remote_failure(self) -> RemoteFailure {
        let message = error_chain(&self);

        if let Some(status) = self.status() {
            return RemoteFailure::http(status.as_u16(), None, message);
        }
        if self.is_timeout() {
            return RemoteFailure::transport(TransportFault::Timeout, message);
        }
        if let Some(fault) = io_fault(&self) {
            return RemoteFailure::transport(fault, message);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return RemoteFailure::transport(TransportFault::ConnectionRefused, message);
        }

        if self.is_request() || self.is_body() {
            return RemoteFailure::transport(TransportFault::Other, message);
        }

        // Builder / decode errors happened locally; there is nothing remote
        // to classify beyond the message.
        RemoteFailure::message(message)
    }
}

/// Walk the source chain for the underlying socket error.
fn io_fault(err: &HttpError) -> Option<TransportFault> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(match io_err.kind() {
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => TransportFault::ConnectionReset,
                io::ErrorKind::ConnectionRefused => TransportFault::ConnectionRefused,
                io::ErrorKind::TimedOut => TransportFault::Timeout,
                _ => TransportFault::Other,
            });
        }
        source = cause.source();
    }
    None
}

fn error_chain(err: &HttpError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let failure = value.into_remote_failure();
        InfraError(AdPulseError::Network(failure.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* non-2xx Response → RemoteFailure */
/* -------------------------------------------------------------------------- */

/// Consume an unsuccessful response into a failure carrying its status and,
/// when it parses, its JSON body.
pub async fn failure_from_response(response: Response) -> RemoteFailure {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("unknown status").to_string();

    let text = match response.text().await {
        Ok(text) => text,
        Err(err) => return RemoteFailure::http(status.as_u16(), None, format!("{reason} ({err})")),
    };

    let body = serde_json::from_str::<serde_json::Value>(&text).ok();
    let message = match &body {
        Some(_) => reason,
        None if text.trim().is_empty() => reason,
        None => format!("{reason}: {}", truncate(text.trim(), 512)),
    };
    RemoteFailure::http(status.as_u16(), body, message)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
