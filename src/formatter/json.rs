//! JSON output formatter, and the reader for its output.

use serde::{Deserialize, Serialize};

use crate::report::{FatalError, FileReport, Report};
use crate::types::{Finding, Severity};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonFileReport {
    file_path: String,
    #[serde(default)]
    findings: Vec<Finding>,
    #[serde(default)]
    error_count: usize,
    #[serde(default)]
    warning_count: usize,
    #[serde(default)]
    info_count: usize,
    #[serde(default)]
    fixable_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fatal: Option<FatalError>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    cancelled: bool,
}

impl From<&FileReport> for JsonFileReport {
    fn from(file: &FileReport) -> Self {
        Self {
            file_path: file.file_path.clone(),
            findings: file.findings.clone(),
            error_count: file.count(Severity::Error),
            warning_count: file.count(Severity::Warning),
            info_count: file.count(Severity::Info),
            fixable_count: file.fixable_count(),
            fatal: file.fatal.clone(),
            cancelled: file.cancelled,
        }
    }
}

impl From<JsonFileReport> for FileReport {
    fn from(file: JsonFileReport) -> Self {
        Self {
            file_path: file.file_path,
            findings: file.findings,
            fatal: file.fatal,
            cancelled: file.cancelled,
        }
    }
}

/// Format a report as a pretty-printed JSON array of file reports.
pub fn format(report: &Report) -> String {
    let files: Vec<JsonFileReport> = report.files.iter().map(JsonFileReport::from).collect();
    serde_json::to_string_pretty(&files).unwrap_or_else(|_| "[]".to_string())
}

/// Read a report back from [`format`]'s output. Counts are recomputed.
pub fn parse(input: &str) -> Result<Report, serde_json::Error> {
    let files: Vec<JsonFileReport> = serde_json::from_str(input)?;
    Ok(Report::new(files.into_iter().map(FileReport::from).collect()))
}
