//! # AdPulse Infrastructure
//!
//! HTTP implementations of the core ports plus the process plumbing around
//! them.
//!
//! This crate contains:
//! - The shared `reqwest` client and its error conversions
//! - Advertising platform adapters (token endpoint, reporting API)
//! - Configuration loading
//! - Tracing subscriber setup
//! - Service wiring

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

pub use bootstrap::build_report_service;
pub use http::*;
pub use integrations::ads::{OAuthTokenRefresher, ReportingClient};
