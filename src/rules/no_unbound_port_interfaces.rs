//! no-unbound-port-interfaces
//!
//! Published ports without a host IP listen on every interface.

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "no-unbound-port-interfaces";
const DESCRIPTION: &str = "Published ports should be bound to an explicit host interface.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Warning, RuleCategory::Security, DESCRIPTION, check).disabled_by_default()
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    for service in &ctx.compose.services {
        for port in &service.ports {
            if port.host_ports.is_none() || port.host_ip.is_some() {
                continue;
            }
            let message = format!(
                "Port \"{}\" of service \"{}\" is published on all interfaces.",
                port.raw, service.name
            );
            findings.push(
                make_finding(
                    ctx,
                    ID,
                    Severity::Warning,
                    RuleCategory::Security,
                    message,
                    &port.location,
                )
                .with_suggestion(format!("Bind it to an interface, e.g. \"127.0.0.1:{}\".", port.raw))
                .with_data("serviceName", service.name.clone())
                .with_data("port", port.raw.clone()),
            );
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run;

    fn check_yaml(yaml: &str) -> Vec<Finding> {
        run(check, yaml)
    }

    #[test]
    fn test_unbound() {
        let yaml = r#"
services:
  web:
    ports:
      - "8080:80"
      - "127.0.0.1:8443:443"
      - "9000"
"#;
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "services.web.ports[0]");
    }

    #[test]
    fn test_long_syntax_host_ip() {
        let yaml = r#"
services:
  web:
    ports:
      - target: 80
        published: 8080
        host_ip: 127.0.0.1
"#;
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(!rule().default_enabled());
    }
}
