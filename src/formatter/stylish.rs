//! Stylish (grouped terminal) output formatter.

use colored::{ColoredString, Colorize};

use crate::report::Report;
use crate::types::Severity;

fn paint(text: &str, color: bool, style: fn(&str) -> ColoredString) -> String {
    if color { style(text).to_string() } else { text.to_string() }
}

fn severity_style(severity: Severity) -> fn(&str) -> ColoredString {
    match severity {
        Severity::Error => |s| s.red().bold(),
        Severity::Warning => |s| s.yellow().bold(),
        Severity::Info => |s| s.cyan(),
    }
}

fn plural(count: usize, word: &str) -> String {
    format!("{} {}{}", count, word, if count == 1 { "" } else { "s" })
}

/// Format a report grouped per file, followed by a summary line.
pub fn format(report: &Report, color: bool) -> String {
    let mut output = String::new();

    for file in &report.files {
        if !file.has_problems() {
            continue;
        }

        output.push_str(&format!("\n{}\n", paint(&file.file_path, color, |s| s.underline())));

        if let Some(fatal) = &file.fatal {
            output.push_str(&format!(
                "  {}:{}  {}  {}  {}\n",
                fatal.line_or_first(),
                fatal.column_or_first(),
                paint("fatal", color, |s| s.red().bold()),
                fatal.message,
                paint(&fatal.kind, color, |s| s.dimmed())
            ));
        }

        for finding in &file.findings {
            let fixable = if finding.fixable { " (fixable)" } else { "" };
            output.push_str(&format!(
                "  {}:{}  {}  {}  {}{}\n",
                finding.line,
                finding.column,
                paint(finding.severity.as_str(), color, severity_style(finding.severity)),
                finding.message,
                paint(finding.rule_id.as_str(), color, |s| s.dimmed()),
                fixable
            ));
        }
    }

    let summary = report.summary();
    if summary.problems() > 0 {
        let mut parts = Vec::new();
        if summary.fatal > 0 {
            parts.push(plural(summary.fatal, "fatal error"));
        }
        if summary.errors > 0 {
            parts.push(plural(summary.errors, "error"));
        }
        if summary.warnings > 0 {
            parts.push(plural(summary.warnings, "warning"));
        }
        if summary.infos > 0 {
            parts.push(plural(summary.infos, "info"));
        }

        let line = format!("{} ({})", plural(summary.problems(), "problem"), parts.join(", "));
        let line = if summary.errors > 0 || summary.fatal > 0 {
            paint(&line, color, |s| s.red().bold())
        } else {
            paint(&line, color, |s| s.yellow().bold())
        };
        output.push_str(&format!("\n  {}\n", line));

        if summary.fixable > 0 {
            output.push_str(&format!(
                "  {} potentially fixable with --fix\n",
                plural(summary.fixable, "problem")
            ));
        }
    }
    if summary.skipped > 0 {
        output.push_str(&format!("  {} skipped (cancelled)\n", plural(summary.skipped, "file")));
    }

    output
}
