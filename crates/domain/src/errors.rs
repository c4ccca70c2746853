//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for AdPulse
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AdPulseError {
    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure while talking to a remote.
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials that cannot work, such as an OAuth client without a secret.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Bad caller input: unreadable job files, missing sections.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input that could not be parsed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Anything that indicates a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for AdPulse operations
pub type Result<T> = std::result::Result<T, AdPulseError>;
