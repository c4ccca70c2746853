//! Command line parsing

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Printed on any argument error.
pub const USAGE: &str = "usage: adpulse [--config <path>] <report|profiles> <job-file>";

/// What to do with the job file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run the report described in the job file.
    Report,
    /// List advertiser profiles visible to the job file's principal.
    Profiles,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Requested action.
    pub action: Action,
    /// Job file to read.
    pub job_file: PathBuf,
    /// Explicit config file; otherwise env then probed paths.
    pub config_path: Option<PathBuf>,
}

impl Command {
    /// Parse arguments, program name excluded.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config_path = None;
        let mut positional = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a path")?;
                    config_path = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => bail!("unknown option {flag}\n{USAGE}"),
                _ => positional.push(arg),
            }
        }

        let [action, job_file]: [String; 2] = match positional.try_into() {
            Ok(pair) => pair,
            Err(_) => bail!(USAGE),
        };
        let action = match action.as_str() {
            "report" => Action::Report,
            "profiles" => Action::Profiles,
            other => bail!("unknown command {other}\n{USAGE}"),
        };

        Ok(Self { action, job_file: PathBuf::from(job_file), config_path })
    }
}
