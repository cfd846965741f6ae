//! no-duplicate-container-names
//!
//! Container names are global on a host, so two services cannot share one.

use std::collections::HashMap;

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "no-duplicate-container-names";
const DESCRIPTION: &str = "Container names must be unique across services.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Error, RuleCategory::BestPractice, DESCRIPTION, check)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for service in &ctx.compose.services {
        let Some(container_name) = &service.container_name else {
            continue;
        };

        match owners.get(container_name.value.as_str()) {
            Some(first) => {
                let message = format!(
                    "Service \"{}\" has container name \"{}\", already used by service \"{}\".",
                    service.name, container_name.value, first
                );
                findings.push(
                    make_finding(
                        ctx,
                        ID,
                        Severity::Error,
                        RuleCategory::BestPractice,
                        message,
                        &container_name.location,
                    )
                    .with_data("serviceName", service.name.clone())
                    .with_data("containerName", container_name.value.clone()),
                );
            }
            None => {
                owners.insert(&container_name.value, &service.name);
            }
        }
    }

    findings
}
