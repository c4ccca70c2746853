//! # AdPulse command line
//!
//! Runs one report job, or one profile listing, for the principal described
//! in a JSON job file and renders the result as JSON.

pub mod command;
pub mod job_file;

use adpulse_domain::Config;
use adpulse_infra::{build_report_service, ReportingClient};
use anyhow::Result;
use serde_json::Value;

pub use command::{Action, Command, USAGE};
pub use job_file::JobFile;

/// Rendered result of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// JSON printed to stdout.
    pub body: Value,
    /// Drives the exit code.
    pub success: bool,
}

/// Execute `command` against the configured endpoints.
pub async fn execute(command: &Command, config: &Config) -> Result<Output> {
    let job = JobFile::load(&command.job_file)?;
    let service = build_report_service(config)?;

    match command.action {
        Action::Report => {
            let spec = job.report_spec()?;
            let outcome = service.run_report_job(&job.principal_id, &job.refresh_tokens, spec).await;
            let success = outcome.success;
            Ok(Output { body: serde_json::to_value(outcome)?, success })
        }
        Action::Profiles => {
            let client = ReportingClient::new(&config.reporting, config.oauth.client_id.clone())?;
            let profiles = service
                .invoke_once(&job.principal_id, &job.refresh_tokens, |credentials| {
                    let client = &client;
                    async move { client.list_profiles(&credentials).await }
                })
                .await?;
            Ok(Output { body: serde_json::to_value(profiles)?, success: true })
        }
    }
}
