//! SARIF formatter.
//!
//! Outputs lint reports in SARIF (Static Analysis Results Interchange
//! Format) 2.1.0 for code scanning integrations.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::report::Report;
use crate::rules::docs_url;
use crate::types::{RuleCode, Severity};

const SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const LOAD_RULE: &str = "load";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDriver {
    name: &'static str,
    information_uri: &'static str,
    version: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help_uri: Option<String>,
    default_configuration: SarifRuleConfiguration,
}

#[derive(Debug, Serialize)]
struct SarifRuleConfiguration {
    level: &'static str,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: u32,
    start_column: u32,
}

fn level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn location(uri: &str, line: u32, column: u32) -> Vec<SarifLocation> {
    vec![SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifactLocation { uri: uri.to_string() },
            region: SarifRegion {
                start_line: line.max(1),
                start_column: column.max(1),
            },
        },
    }]
}

/// Format a report as a single-run SARIF log.
pub fn format(report: &Report) -> String {
    // Rules keyed by id, first-seen severity as the default level.
    let mut rules: BTreeMap<String, SarifRule> = BTreeMap::new();
    let mut results = Vec::new();

    for file in &report.files {
        if let Some(fatal) = &file.fatal {
            rules.entry(LOAD_RULE.to_string()).or_insert(SarifRule {
                id: LOAD_RULE.to_string(),
                help_uri: None,
                default_configuration: SarifRuleConfiguration { level: "error" },
            });
            results.push(SarifResult {
                rule_id: LOAD_RULE.to_string(),
                level: "error",
                message: SarifMessage {
                    text: fatal.message.clone(),
                },
                locations: location(&file.file_path, fatal.line_or_first(), fatal.column_or_first()),
            });
        }

        for finding in &file.findings {
            let id = finding.rule_id.as_str().to_string();
            rules.entry(id.clone()).or_insert_with(|| SarifRule {
                help_uri: help_uri(&finding.rule_id),
                id: id.clone(),
                default_configuration: SarifRuleConfiguration {
                    level: level(finding.severity),
                },
            });
            let uri = if finding.file.is_empty() { &file.file_path } else { &finding.file };
            results.push(SarifResult {
                rule_id: id,
                level: level(finding.severity),
                message: SarifMessage {
                    text: finding.message.clone(),
                },
                locations: location(uri, finding.line, finding.column),
            });
        }
    }

    let log = SarifReport {
        schema: SCHEMA,
        version: "2.1.0",
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "dclint",
                    information_uri: "https://github.com/zavoloklom/docker-compose-linter",
                    version: env!("CARGO_PKG_VERSION"),
                    rules: rules.into_values().collect(),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&log).unwrap_or_else(|_| "{}".to_string())
}

fn help_uri(rule: &RuleCode) -> Option<String> {
    if rule.is_schema_rule() {
        None
    } else {
        Some(docs_url(rule.as_str()))
    }
}
