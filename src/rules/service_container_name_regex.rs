//! service-container-name-regex
//!
//! Container names must match `^[a-zA-Z0-9][a-zA-Z0-9_.-]+$`.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "service-container-name-regex";
const DESCRIPTION: &str = "Container names must match the pattern accepted by the container engine.";
const PATTERN: &str = r"^[a-zA-Z0-9][a-zA-Z0-9_.-]+$";

static CONTAINER_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(PATTERN).unwrap());

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Error, RuleCategory::Style, DESCRIPTION, check)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    for service in &ctx.compose.services {
        let Some(container_name) = &service.container_name else {
            continue;
        };
        if CONTAINER_NAME.is_match(&container_name.value) {
            continue;
        }

        let message = format!(
            "Container name \"{}\" of service \"{}\" does not match {}.",
            container_name.value, service.name, PATTERN
        );
        findings.push(
            make_finding(
                ctx,
                ID,
                Severity::Error,
                RuleCategory::Style,
                message,
                &container_name.location,
            )
            .with_data("serviceName", service.name.clone())
            .with_data("containerName", container_name.value.clone()),
        );
    }

    findings
}
