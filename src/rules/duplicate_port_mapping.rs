//! duplicate-port-mapping
//!
//! Two services publishing the same host port and protocol cannot start
//! together. Ranges are expanded; bindings on two different explicit host
//! IPs do not collide, while an unbound port collides with any binding.
//! Only the second and later occurrences are reported.

use std::collections::HashMap;

use crate::parser::ServicePort;
use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "duplicate-port-mapping";
const DESCRIPTION: &str = "Host ports must be published by at most one service.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Error, RuleCategory::BestPractice, DESCRIPTION, check)
}

/// An earlier binding of a host port.
struct Binding<'a> {
    service: &'a str,
    host_ip: Option<&'a str>,
}

fn collides(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

fn bound_ip(port: &ServicePort) -> Option<&str> {
    if port.binds_all_interfaces() {
        None
    } else {
        port.host_ip.as_deref()
    }
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen: HashMap<(u16, &str), Vec<Binding>> = HashMap::new();

    for service in &ctx.compose.services {
        for port in &service.ports {
            let Some(host_ports) = port.host_ports else {
                continue;
            };
            let host_ip = bound_ip(port);
            let mut conflict: Option<(u16, &str)> = None;

            for host_port in host_ports.ports() {
                let bindings = seen.entry((host_port, port.protocol.as_str())).or_default();
                if conflict.is_none() {
                    conflict = bindings
                        .iter()
                        .find(|b| collides(b.host_ip, host_ip))
                        .map(|b| (host_port, b.service));
                }
                bindings.push(Binding {
                    service: &service.name,
                    host_ip,
                });
            }

            let Some((host_port, first)) = conflict else {
                continue;
            };
            let message = if first == service.name {
                format!(
                    "Service \"{}\" publishes host port {}/{} more than once.",
                    service.name, host_port, port.protocol
                )
            } else {
                format!(
                    "Host port {}/{} of service \"{}\" is already published by service \"{}\".",
                    host_port, port.protocol, service.name, first
                )
            };

            findings.push(
                make_finding(
                    ctx,
                    ID,
                    Severity::Error,
                    RuleCategory::BestPractice,
                    message,
                    &port.location,
                )
                .with_data("serviceName", service.name.clone())
                .with_data("conflictingService", first)
                .with_data("hostPort", host_port.to_string())
                .with_data("protocol", port.protocol.clone()),
            );
        }
    }

    findings
}
