//! Advertising platform adapters

pub mod auth;
pub mod client;
mod types;

pub use auth::OAuthTokenRefresher;
pub use client::ReportingClient;
