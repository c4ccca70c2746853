//! Shared utilities for the AdPulse crates.
//!
//! - [`clock`]: wall-clock abstraction (`MockClock` behind `test-utils`)
//! - [`compression`]: gzip codec for downloaded report bodies

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod clock;
pub mod compression;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
