//! Report body decoding and row normalization

use adpulse_common::compression::gunzip_if_compressed;
use adpulse_domain::ReportRow;
use serde_json::Value;

use super::error::ReportJobError;

/// Gunzip (when compressed) and parse a downloaded report into raw rows.
///
/// The body must be a top-level JSON array. An empty body decodes to no rows.
pub fn decode_report_body(body: &[u8]) -> Result<Vec<Value>, ReportJobError> {
    let raw = gunzip_if_compressed(body).map_err(|err| ReportJobError::decode(err.to_string()))?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    match serde_json::from_slice::<Value>(&raw) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(other) => Err(ReportJobError::decode(format!(
            "expected a JSON array of rows, got {}",
            json_type(&other)
        ))),
        Err(err) => Err(ReportJobError::decode(format!("report body is not valid JSON: {err}"))),
    }
}

/// Projects rows onto the requested columns. Every requested column is
/// present in the output, `null` when the remote omitted it; extra fields are
/// kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowNormalizer {
    columns: Vec<String>,
}

impl RowNormalizer {
    /// Normalizer for the requested `columns`.
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { columns: columns.into_iter().map(Into::into).collect() }
    }

    /// Project one row, rejecting anything that is not a JSON object.
    pub fn normalize(&self, row: Value) -> Result<ReportRow, ReportJobError> {
        let Value::Object(mut fields) = row else {
            return Err(ReportJobError::decode(format!(
                "expected report row to be an object, got {}",
                json_type(&row)
            )));
        };
        for column in &self.columns {
            fields.entry(column.as_str()).or_insert(Value::Null);
        }
        Ok(fields)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
