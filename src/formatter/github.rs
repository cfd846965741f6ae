//! GitHub Actions output formatter.
//!
//! Produces output in GitHub Actions workflow command format:
//! ::error file={name},line={line},col={col},title={rule}::{message}

use crate::report::Report;
use crate::types::Severity;

/// Format a report for GitHub Actions.
pub fn format(report: &Report) -> String {
    let mut output = String::new();

    for file in &report.files {
        if let Some(fatal) = &file.fatal {
            output.push_str(&format!(
                "::error file={},line={},col={},title=load::{}\n",
                escape_property(&file.file_path),
                fatal.line_or_first(),
                fatal.column_or_first(),
                escape_data(&fatal.message)
            ));
        }

        for finding in &file.findings {
            let level = match finding.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "notice",
            };
            let name = if finding.file.is_empty() { &file.file_path } else { &finding.file };

            output.push_str(&format!(
                "::{} file={},line={},col={},title={}::{}\n",
                level,
                escape_property(name),
                finding.line,
                finding.column,
                escape_property(finding.rule_id.as_str()),
                escape_data(&finding.message)
            ));
        }
    }

    output
}

/// Escape the message part of a workflow command.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a `key=value` property of a workflow command.
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
