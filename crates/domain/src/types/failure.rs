//! Raw description of a failed remote call
//!
//! Adapters translate whatever their transport raised into a
//! [`RemoteFailure`]; classification into retry categories happens later in
//! one place. Nothing here interprets the failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure that happened before any HTTP response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFault {
    /// No response within the request timeout.
    Timeout,
    /// Peer dropped the connection.
    ConnectionReset,
    /// Nothing listening.
    ConnectionRefused,
    /// Any other transport error.
    Other,
}

/// A failed remote call as observed by an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFailure {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Response body, when it parsed as JSON.
    pub body: Option<serde_json::Value>,
    /// Short description for logs and error messages.
    pub message: String,
    /// Set when no response was received at all.
    pub transport: Option<TransportFault>,
}

impl RemoteFailure {
    /// Failure carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self { status: None, body: None, message: message.into(), transport: None }
    }

    /// Non-success HTTP response.
    pub fn http(status: u16, body: Option<serde_json::Value>, message: impl Into<String>) -> Self {
        Self { status: Some(status), body, message: message.into(), transport: None }
    }

    /// No response received.
    pub fn transport(fault: TransportFault, message: impl Into<String>) -> Self {
        Self { status: None, body: None, message: message.into(), transport: Some(fault) }
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.transport) {
            (Some(status), _) => write!(f, "HTTP {status}: {}", self.message),
            (None, Some(fault)) => write!(f, "{fault:?}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteFailure {}
