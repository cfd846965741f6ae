//! Plain one-line-per-problem output.

use crate::report::Report;

/// `file:line:col [severity] rule: message`, fatal errors as `[fatal] load:`.
pub fn format(report: &Report) -> String {
    let mut output = String::new();

    for file in &report.files {
        if let Some(fatal) = &file.fatal {
            output.push_str(&format!(
                "{}:{}:{} [fatal] load: {}\n",
                file.file_path,
                fatal.line_or_first(),
                fatal.column_or_first(),
                fatal.message
            ));
        }

        for finding in &file.findings {
            let name = if finding.file.is_empty() {
                file.file_path.as_str()
            } else {
                finding.file.as_str()
            };
            output.push_str(&format!(
                "{}:{}:{} [{}] {}: {}\n",
                name, finding.line, finding.column, finding.severity, finding.rule_id, finding.message
            ));
        }
    }

    output
}
