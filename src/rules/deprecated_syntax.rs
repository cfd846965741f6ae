//! deprecated-syntax
//!
//! Flags constructs from older compose file formats that the current
//! specification has superseded:
//! - the top-level `version` key
//! - the service-level `volume_driver` key
//! - `external: { name: ... }` on volumes and networks

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::{Location, Node};
use crate::rules::{FixableRule, LintContext, Rule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "deprecated-syntax";
const DESCRIPTION: &str = "Constructs removed from the current compose specification should be replaced.";

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^version\s*:").unwrap());

pub fn rule() -> impl Rule {
    FixableRule::new(ID, Severity::Warning, RuleCategory::Style, DESCRIPTION, check, fix)
}

fn finding(ctx: &LintContext, message: String, suggestion: &str, location: &Location) -> Finding {
    make_finding(ctx, ID, Severity::Warning, RuleCategory::Style, message, location).with_suggestion(suggestion)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(version) = &ctx.compose.version {
        findings.push(
            finding(
                ctx,
                format!(
                    "The top-level \"version\" key (\"{}\") is obsolete.",
                    version.value
                ),
                "Remove the \"version\" key; the file format is detected automatically.",
                &version.location,
            )
            .with_fixable(true)
            .with_data("version", version.value.clone()),
        );
    }

    for service in &ctx.compose.services {
        if !service.keys.iter().any(|k| k == "volume_driver") {
            continue;
        }
        let Some(node) = ctx.service_node(&service.name) else {
            continue;
        };
        findings.push(finding(
            ctx,
            format!("Service \"{}\" uses the obsolete \"volume_driver\" key.", service.name),
            "Declare the driver on a top-level named volume instead.",
            &service.key_location("volume_driver", node),
        ));
    }

    for section in ["volumes", "networks"] {
        let Some(entries) = ctx.document.root.get(section).and_then(Node::as_mapping) else {
            continue;
        };
        for entry in entries {
            let Some(external) = entry.value.entry("external") else {
                continue;
            };
            let Some(name) = external.value.get("name").and_then(Node::as_str) else {
                continue;
            };
            let location = Location::new(
                external.value.file,
                external.key_pos,
                format!("{}.{}.external", section, entry.key),
            );
            findings.push(finding(
                ctx,
                format!(
                    "\"external.name\" on {} \"{}\" is obsolete.",
                    section.trim_end_matches('s'),
                    entry.key
                ),
                &format!("Use \"external: true\" together with \"name: {}\".", name),
                &location,
            ));
        }
    }

    findings
}

/// Remove the top-level `version` line and a blank line following it.
fn fix(source: &str) -> Option<String> {
    let mut result = Vec::new();
    let mut modified = false;
    let mut skip_blank = false;

    for line in source.lines() {
        if VERSION_LINE.is_match(line) {
            modified = true;
            skip_blank = true;
            continue;
        }
        if skip_blank && line.trim().is_empty() {
            skip_blank = false;
            continue;
        }
        skip_blank = false;
        result.push(line);
    }

    if !modified {
        return None;
    }
    let mut output = result.join("\n");
    if source.ends_with('\n') {
        output.push('\n');
    }
    Some(output)
}
