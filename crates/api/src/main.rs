//! AdPulse - ads report fetcher
//!
//! Main entry point for the command line tool.

use adpulse_api::{execute, Command};
use adpulse_infra::config;
use adpulse_infra::observability::init_logging;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the config so ADPULSE_* variables can come from it
    let dotenv = dotenvy::dotenv();

    let command = Command::parse(std::env::args().skip(1))?;
    let config = match &command.config_path {
        Some(path) => config::load_from_file(Some(path.clone()))?,
        None => config::load()?,
    };
    init_logging(&config.logging)?;

    match dotenv {
        Ok(path) => tracing::info!("Loaded .env from: {:?}", path),
        Err(e) => tracing::debug!("Could not load .env file: {}", e),
    }

    let output = execute(&command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output.body)?);

    if !output.success {
        std::process::exit(1);
    }
    Ok(())
}
