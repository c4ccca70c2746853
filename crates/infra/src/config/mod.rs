//! Configuration loading
//!
//! Environment variables first, then config files in the usual places.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
