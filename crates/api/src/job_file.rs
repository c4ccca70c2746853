//! Job description read from disk

use std::path::Path;

use adpulse_domain::{AdPulseError, PrincipalId, RefreshTokens, ReportJobSpec, Result};
use serde::Deserialize;

/// Who to act for and, for report runs, what to fetch.
///
/// ```json
/// {
///   "principalId": "acct-42",
///   "refreshTokens": { "reporting": "Atzr|...", "catalog": "Atzr|..." },
///   "report": { "profileId": "3141592", "request": { ... } }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFile {
    /// Principal the tokens belong to.
    pub principal_id: PrincipalId,
    /// Refresh tokens per slot; blank ones are dropped.
    pub refresh_tokens: RefreshTokens,
    /// Required by `report`, ignored by `profiles`.
    #[serde(default)]
    pub report: Option<ReportJobSpec>,
}

impl JobFile {
    /// Read and parse a job file.
    ///
    /// # Errors
    /// `InvalidInput` when the file cannot be read, `Decode` when it is not a
    /// valid job description.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            AdPulseError::InvalidInput(format!("failed to read job file {}: {err}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            AdPulseError::Decode(format!("invalid job file {}: {err}", path.display()))
        })
    }

    /// The report to run; report commands need one.
    pub fn report_spec(&self) -> Result<&ReportJobSpec> {
        self.report
            .as_ref()
            .ok_or_else(|| AdPulseError::InvalidInput("job file has no report section".into()))
    }
}
