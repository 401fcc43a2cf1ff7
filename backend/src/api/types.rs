//! REST API types for the presentation layer.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::{AnalysisReport, PipelineOutput, TableInfo};

/// Response sent after a table upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub job_id: String,

    /// "ready", or "empty" when no aggregate survived the filters
    pub status: String,

    /// RFC 3339 time the response was built
    pub generated_at: String,

    pub table: TableMetadata,

    pub report: AnalysisReport,
}

/// Input table metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub period_axis: String,
    pub dimensions: Vec<String>,
    pub row_count: usize,
}

impl From<TableInfo> for TableMetadata {
    fn from(info: TableInfo) -> Self {
        TableMetadata {
            encoding: info.encoding,
            delimiter: crate::transform::pipeline::format_delimiter(info.delimiter),
            period_axis: info.period_axis,
            dimensions: info.dimensions,
            row_count: info.row_count,
        }
    }
}

impl From<PipelineOutput> for AnalysisResponse {
    fn from(output: PipelineOutput) -> Self {
        let status = if output.report.aggregates.is_empty() { "empty" } else { "ready" };

        AnalysisResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            table: output.table_info.into(),
            report: output.report,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "generatedAt": Utc::now().to_rfc3339(),
    })
}
