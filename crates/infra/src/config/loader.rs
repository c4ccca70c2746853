//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `ADPULSE_OAUTH_TOKEN_URL`, `ADPULSE_OAUTH_CLIENT_ID`,
//!   `ADPULSE_OAUTH_CLIENT_SECRET`: token endpoint for the reporting slot
//! - `ADPULSE_REPORTING_BASE_URL`: reporting API root
//!
//! Optional:
//! - `ADPULSE_CATALOG_OAUTH_TOKEN_URL`, `ADPULSE_CATALOG_OAUTH_CLIENT_ID`,
//!   `ADPULSE_CATALOG_OAUTH_CLIENT_SECRET`: catalog slot override (all or none)
//! - `ADPULSE_REQUEST_TIMEOUT_SECS`, `ADPULSE_HTTP_MAX_ATTEMPTS`
//! - `ADPULSE_REFRESH_THRESHOLD_SECS`
//! - `ADPULSE_POLL_INTERVAL_SECS`, `ADPULSE_MAX_POLL_ATTEMPTS`,
//!   `ADPULSE_DEADLINE_SECS`, `ADPULSE_CHUNK_SIZE`
//! - `ADPULSE_LOG_LEVEL`, `ADPULSE_LOG_JSON` (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./adpulse.{json,toml}` then `./config.{json,toml}` (current directory)
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use adpulse_domain::{
    AdPulseError, Config, CredentialPolicyConfig, LoggingConfig, OAuthClientConfig,
    ReportJobConfig, ReportingConfig, Result,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["adpulse.json", "adpulse.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `AdPulseError::Config` if neither source yields a valid config.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `AdPulseError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let oauth = OAuthClientConfig {
        token_url: env_var("ADPULSE_OAUTH_TOKEN_URL")?,
        client_id: env_var("ADPULSE_OAUTH_CLIENT_ID")?,
        client_secret: env_var("ADPULSE_OAUTH_CLIENT_SECRET")?,
    };

    let catalog_oauth = match std::env::var("ADPULSE_CATALOG_OAUTH_TOKEN_URL").ok() {
        Some(token_url) => Some(OAuthClientConfig {
            token_url,
            client_id: env_var("ADPULSE_CATALOG_OAUTH_CLIENT_ID")?,
            client_secret: env_var("ADPULSE_CATALOG_OAUTH_CLIENT_SECRET")?,
        }),
        None => None,
    };

    let mut reporting = ReportingConfig::new(env_var("ADPULSE_REPORTING_BASE_URL")?);
    if let Some(timeout) = env_parse("ADPULSE_REQUEST_TIMEOUT_SECS")? {
        reporting.request_timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse("ADPULSE_HTTP_MAX_ATTEMPTS")? {
        reporting.http_max_attempts = attempts;
    }

    let mut credentials = CredentialPolicyConfig::default();
    if let Some(threshold) = env_parse("ADPULSE_REFRESH_THRESHOLD_SECS")? {
        credentials.refresh_threshold_secs = threshold;
    }

    let mut jobs = ReportJobConfig::default();
    if let Some(interval) = env_parse("ADPULSE_POLL_INTERVAL_SECS")? {
        jobs.poll_interval_secs = interval;
    }
    jobs.max_poll_attempts = env_parse("ADPULSE_MAX_POLL_ATTEMPTS")?;
    jobs.deadline_secs = env_parse("ADPULSE_DEADLINE_SECS")?;
    if let Some(chunk_size) = env_parse("ADPULSE_CHUNK_SIZE")? {
        jobs.chunk_size = chunk_size;
    }

    let defaults = LoggingConfig::default();
    let logging = LoggingConfig {
        level: std::env::var("ADPULSE_LOG_LEVEL").unwrap_or(defaults.level),
        json: env_bool("ADPULSE_LOG_JSON", defaults.json),
    };

    Ok(Config { oauth, catalog_oauth, reporting, credentials, jobs, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]). JSON and TOML are detected by extension.
///
/// # Errors
/// Returns `AdPulseError::Config` if the file is missing, unreadable or
/// does not describe a valid config.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AdPulseError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AdPulseError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AdPulseError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AdPulseError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AdPulseError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(AdPulseError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file among the standard locations, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    probe_in(&roots)
}

fn probe_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        AdPulseError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable; unset means `None`.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AdPulseError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::{Builder, TempDir};

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED: [(&str, &str); 4] = [
        ("ADPULSE_OAUTH_TOKEN_URL", "https://api.amazon.com/auth/o2/token"),
        ("ADPULSE_OAUTH_CLIENT_ID", "amzn1.application-oa2-client.abc"),
        ("ADPULSE_OAUTH_CLIENT_SECRET", "secret"),
        ("ADPULSE_REPORTING_BASE_URL", "https://advertising-api.amazon.com"),
    ];

    const OPTIONAL: [&str; 13] = [
        "ADPULSE_CATALOG_OAUTH_TOKEN_URL",
        "ADPULSE_CATALOG_OAUTH_CLIENT_ID",
        "ADPULSE_CATALOG_OAUTH_CLIENT_SECRET",
        "ADPULSE_REQUEST_TIMEOUT_SECS",
        "ADPULSE_HTTP_MAX_ATTEMPTS",
        "ADPULSE_REFRESH_THRESHOLD_SECS",
        "ADPULSE_POLL_INTERVAL_SECS",
        "ADPULSE_MAX_POLL_ATTEMPTS",
        "ADPULSE_DEADLINE_SECS",
        "ADPULSE_CHUNK_SIZE",
        "ADPULSE_LOG_LEVEL",
        "ADPULSE_LOG_JSON",
        "ADPULSE_UNUSED",
    ];

    fn set_required() {
        for (key, value) in REQUIRED {
            std::env::set_var(key, value);
        }
    }

    fn clear_all() {
        for (key, _) in REQUIRED {
            std::env::remove_var(key);
        }
        for key in OPTIONAL {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("ADPULSE_TEST_BOOL_ON", "ON");
        std::env::set_var("ADPULSE_TEST_BOOL_OFF", "0");
        std::env::remove_var("ADPULSE_TEST_BOOL_MISSING");

        assert!(env_bool("ADPULSE_TEST_BOOL_ON", false));
        assert!(!env_bool("ADPULSE_TEST_BOOL_OFF", true));
        assert!(env_bool("ADPULSE_TEST_BOOL_MISSING", true));

        std::env::remove_var("ADPULSE_TEST_BOOL_ON");
        std::env::remove_var("ADPULSE_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();

        let config = load_from_env().expect("config from env");

        assert_eq!(config.oauth.client_id, "amzn1.application-oa2-client.abc");
        assert_eq!(config.reporting.base_url, "https://advertising-api.amazon.com");
        assert_eq!(config.reporting.http_max_attempts, 1);
        assert_eq!(config.credentials, CredentialPolicyConfig::default());
        assert_eq!(config.jobs, ReportJobConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.catalog_oauth.is_none());

        clear_all();
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();
        std::env::set_var("ADPULSE_CATALOG_OAUTH_TOKEN_URL", "https://catalog.example/token");
        std::env::set_var("ADPULSE_CATALOG_OAUTH_CLIENT_ID", "catalog-client");
        std::env::set_var("ADPULSE_CATALOG_OAUTH_CLIENT_SECRET", "catalog-secret");
        std::env::set_var("ADPULSE_POLL_INTERVAL_SECS", "5");
        std::env::set_var("ADPULSE_MAX_POLL_ATTEMPTS", "40");
        std::env::set_var("ADPULSE_CHUNK_SIZE", "100");
        std::env::set_var("ADPULSE_LOG_JSON", "yes");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.catalog_oauth().client_id, "catalog-client");
        assert_eq!(config.jobs.poll_interval_secs, 5);
        assert_eq!(config.jobs.max_poll_attempts, Some(40));
        assert_eq!(config.jobs.deadline_secs, None);
        assert_eq!(config.jobs.chunk_size, 100);
        assert!(config.logging.json);

        clear_all();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, AdPulseError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();
        std::env::set_var("ADPULSE_MAX_POLL_ATTEMPTS", "lots");

        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("ADPULSE_MAX_POLL_ATTEMPTS"));

        clear_all();
    }

    #[test]
    fn test_partial_catalog_override_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_all();
        set_required();
        std::env::set_var("ADPULSE_CATALOG_OAUTH_TOKEN_URL", "https://catalog.example/token");

        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("ADPULSE_CATALOG_OAUTH_CLIENT_ID"));

        clear_all();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
            [oauth]
            token_url = "https://api.amazon.com/auth/o2/token"
            client_id = "client"
            client_secret = "secret"

            [reporting]
            base_url = "https://advertising-api-eu.amazon.com"
            http_max_attempts = 3

            [jobs]
            poll_interval_secs = 30
            deadline_secs = 3600
            chunk_size = 250
        "#;

        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).expect("toml config");

        assert_eq!(config.reporting.base_url, "https://advertising-api-eu.amazon.com");
        assert_eq!(config.reporting.http_max_attempts, 3);
        assert_eq!(config.jobs.deadline_secs, Some(3600));
        assert_eq!(config.jobs.max_poll_attempts, None);
        assert_eq!(config.jobs.chunk_size, 250);
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON format"));
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file(Some(PathBuf::from("/definitely/not/here/adpulse.json")))
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_config("", Path::new("adpulse.yaml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_probe_prefers_adpulse_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("adpulse.toml"), "").unwrap();

        let found = probe_in(&[dir.path().to_path_buf()]);

        assert_eq!(found, Some(dir.path().join("adpulse.toml")));
    }

    #[test]
    fn test_probe_falls_through_roots() {
        let empty = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        std::fs::write(parent.path().join("config.toml"), "").unwrap();

        let found = probe_in(&[empty.path().to_path_buf(), parent.path().to_path_buf()]);

        assert_eq!(found, Some(parent.path().join("config.toml")));
        assert_eq!(probe_in(&[empty.path().to_path_buf()]), None);
    }
}
