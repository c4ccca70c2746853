//! Adapters for third-party platforms

pub mod ads;
