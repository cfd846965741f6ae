//! Aggregated lint results.
//!
//! A [`Report`] is built once per run from the per-file results, in input
//! order. Formatters only read it.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::types::{Finding, Severity};

/// Why a file produced no findings at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalError {
    /// Machine-readable kind (`parse`, `cyclic-include`, `io`, ...).
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl FatalError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Line for display; fatal errors without a position point at 1:1.
    pub fn line_or_first(&self) -> u32 {
        self.line.unwrap_or(1)
    }

    pub fn column_or_first(&self) -> u32 {
        self.column.unwrap_or(1)
    }
}

impl From<&LoadError> for FatalError {
    fn from(err: &LoadError) -> Self {
        let message = match err {
            LoadError::Parse(parse) => parse.message.clone(),
            other => other.to_string(),
        };
        let fatal = Self::new(err.kind(), message);
        match err.position() {
            Some((line, column)) => fatal.at(line, column),
            None => fatal,
        }
    }
}

/// Results for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileReport {
    /// Display name of the input (path or `<stdin>`).
    pub file_path: String,
    pub findings: Vec<Finding>,
    /// Set when the file could not be loaded.
    pub fatal: Option<FatalError>,
    /// Set when the run was cancelled before this file started.
    pub cancelled: bool,
}

impl FileReport {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn with_findings(mut self, mut findings: Vec<Finding>) -> Self {
        findings.sort();
        self.findings = findings;
        self
    }

    pub fn failed(file_path: impl Into<String>, fatal: FatalError) -> Self {
        Self {
            fatal: Some(fatal),
            ..Self::new(file_path)
        }
    }

    pub fn cancelled(file_path: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::new(file_path)
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn fixable_count(&self) -> usize {
        self.findings.iter().filter(|f| f.fixable).count()
    }

    /// Whether there is anything to print for this file.
    pub fn has_problems(&self) -> bool {
        !self.findings.is_empty() || self.fatal.is_some()
    }
}

/// Totals across a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub fixable: usize,
    /// Files that ended in a fatal load error.
    pub fatal: usize,
    pub files: usize,
    /// Files never started because the run was cancelled.
    pub skipped: usize,
}

impl Summary {
    pub fn problems(&self) -> usize {
        self.errors + self.warnings + self.infos + self.fatal
    }
}

/// All per-file results of a run, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub files: Vec<FileReport>,
}

impl Report {
    pub fn new(files: Vec<FileReport>) -> Self {
        let mut report = Self { files };
        report.finalize();
        report
    }

    /// Sort every file's findings by position and rule id.
    pub fn finalize(&mut self) {
        for file in &mut self.files {
            file.findings.sort();
        }
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.findings.iter())
    }

    pub fn has_fatal(&self) -> bool {
        self.files.iter().any(|f| f.fatal.is_some())
    }

    /// Highest severity among all findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings().map(|f| f.severity).max()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            files: self.files.len(),
            ..Summary::default()
        };
        for file in &self.files {
            if file.fatal.is_some() {
                summary.fatal += 1;
            }
            if file.cancelled {
                summary.skipped += 1;
            }
            for finding in &file.findings {
                match finding.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
                if finding.fixable {
                    summary.fixable += 1;
                }
            }
        }
        summary
    }
}
