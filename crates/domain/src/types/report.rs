//! Asynchronous report request and status types
//!
//! Field names follow the reporting API's camelCase wire format so these
//! types serialize straight into request bodies.

use serde::{Deserialize, Serialize};

use crate::constants::REPORT_FORMAT_GZIP_JSON;

/// One decoded, normalized report row.
pub type ReportRow = serde_json::Map<String, serde_json::Value>;

/// Everything needed to run one report job for a principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJobSpec {
    /// Advertiser profile the report is scoped to (sent as a header).
    pub profile_id: String,
    /// Create-report body.
    pub request: CreateReportRequest,
}

/// Body of the create-report call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// Label shown in the advertiser console.
    pub name: String,
    /// First day covered, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day covered, inclusive.
    pub end_date: String,
    /// What the report contains.
    pub configuration: ReportConfiguration,
}

/// Report shape: product, type, grouping, columns and filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfiguration {
    /// e.g. `SPONSORED_PRODUCTS`.
    pub ad_product: String,
    /// e.g. `spCampaigns`.
    pub report_type_id: String,
    /// Defaults to gzip-compressed JSON.
    #[serde(default = "default_format")]
    pub format: String,
    /// Grouping dimensions.
    pub group_by: Vec<String>,
    /// Requested columns; every row carries each one.
    pub columns: Vec<String>,
    /// Optional server-side filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ReportFilter>,
    /// Aggregation granularity.
    pub time_unit: TimeUnit,
}

/// Column filter applied server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Column to filter on.
    pub field: String,
    /// Accepted values.
    pub values: Vec<String>,
}

/// Aggregation granularity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    /// One row per group for the whole range.
    Summary,
    /// One row per group per day.
    Daily,
}

/// Response of the create-report call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    /// Id to poll.
    pub report_id: String,
}

/// Response of the report-status call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReportStatus {
    /// Echo of the report id, when present.
    #[serde(default)]
    pub report_id: Option<String>,
    /// Raw status string, see `RemoteState::parse` in core.
    pub status: String,
    /// Download location once completed.
    #[serde(default)]
    pub url: Option<String>,
    /// Reason given for a failed report.
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// Advertiser profile returned by the profile listing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiserProfile {
    /// Numeric profile id.
    pub profile_id: i64,
    /// Marketplace country.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Billing currency.
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Reporting timezone.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Owning account.
    #[serde(default)]
    pub account_info: Option<AccountInfo>,
}

/// Account owning an advertiser profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account id.
    pub id: String,
    /// `seller`, `vendor` or `agency`.
    #[serde(rename = "type")]
    pub account_type: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Marketplace the account sells in.
    #[serde(default)]
    pub marketplace_string_id: Option<String>,
}

fn default_format() -> String {
    REPORT_FORMAT_GZIP_JSON.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_wire_names() {
        let request = CreateReportRequest {
            name: "SP campaigns".into(),
            start_date: "2024-05-01".into(),
            end_date: "2024-05-07".into(),
            configuration: ReportConfiguration {
                ad_product: "SPONSORED_PRODUCTS".into(),
                report_type_id: "spCampaigns".into(),
                format: default_format(),
                group_by: vec!["campaign".into()],
                columns: vec!["impressions".into(), "clicks".into()],
                filters: vec![],
                time_unit: TimeUnit::Daily,
            },
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["startDate"], "2024-05-01");
        assert_eq!(value["configuration"]["reportTypeId"], "spCampaigns");
        assert_eq!(value["configuration"]["format"], "GZIP_JSON");
        assert_eq!(value["configuration"]["timeUnit"], "DAILY");
        assert!(value["configuration"].get("filters").is_none());
    }

    #[test]
    fn status_tolerates_missing_optional_fields() {
        let status: RemoteReportStatus =
            serde_json::from_str(r#"{"status":"PENDING"}"#).unwrap();

        assert_eq!(status.status, "PENDING");
        assert!(status.url.is_none());
    }
}
