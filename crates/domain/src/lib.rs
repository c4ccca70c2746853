//! # AdPulse Domain
//!
//! Data types shared by every AdPulse crate.
//!
//! This crate contains:
//! - Principals, token slots and credential sets
//! - Report job request/status types
//! - Raw remote failure description
//! - Configuration structures and defaults
//! - Domain error type and Result alias
//!
//! ## Architecture
//! - No dependencies on other AdPulse crates
//! - Pure data, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

pub use config::*;
pub use constants::*;
pub use errors::*;
pub use types::*;
