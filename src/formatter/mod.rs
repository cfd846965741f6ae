//! Output formatters for lint reports.
//!
//! Every formatter is a pure function of a [`Report`]:
//! - Text - One line per finding (default)
//! - Stylish - Grouped per file with a summary, optionally coloured
//! - JSON - Machine-readable tree, readable back with [`json::parse`]
//! - SARIF - SARIF 2.1.0 for code scanning tools
//! - GitHub - GitHub Actions annotations

pub mod github;
pub mod json;
pub mod sarif;
pub mod stylish;
pub mod text;

use crate::report::Report;

/// Output format for lint reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `file:line:col [severity] rule: message`
    #[default]
    Text,
    /// Grouped terminal output
    Stylish,
    /// JSON for machine processing
    Json,
    /// SARIF 2.1.0
    Sarif,
    /// GitHub Actions workflow commands
    GitHub,
}

impl OutputFormat {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "compact" => Some(Self::Text),
            "stylish" => Some(Self::Stylish),
            "json" => Some(Self::Json),
            "sarif" => Some(Self::Sarif),
            "github" | "github-actions" => Some(Self::GitHub),
            _ => None,
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["text", "stylish", "json", "sarif", "github"]
    }
}

/// Rendering switches shared by all formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Emit ANSI colour codes (stylish only).
    pub color: bool,
}

/// Format a report according to the specified format.
pub fn format_report(report: &Report, format: OutputFormat, options: &FormatOptions) -> String {
    match format {
        OutputFormat::Text => text::format(report),
        OutputFormat::Stylish => stylish::format(report, options.color),
        OutputFormat::Json => json::format(report),
        OutputFormat::Sarif => sarif::format(report),
        OutputFormat::GitHub => github::format(report),
    }
}
