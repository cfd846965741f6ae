//! missing-resource-limits
//!
//! Services should declare CPU and memory limits under
//! `deploy.resources.limits`. The legacy `cpus` and `mem_limit` keys count.

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "missing-resource-limits";
const DESCRIPTION: &str = "Services should declare CPU and memory limits.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Info, RuleCategory::Performance, DESCRIPTION, check)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    for service in &ctx.compose.services {
        let missing: Vec<&str> = [
            (!service.has_cpu_limit).then_some("cpus"),
            (!service.has_memory_limit).then_some("memory"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if missing.is_empty() {
            continue;
        }

        let message = format!(
            "Service \"{}\" does not define a {} limit.",
            service.name,
            missing.join(" or ")
        );

        findings.push(
            make_finding(
                ctx,
                ID,
                Severity::Info,
                RuleCategory::Performance,
                message,
                &service.location,
            )
            .with_suggestion(format!(
                "Set deploy.resources.limits.{} for this service.",
                missing.join(" and deploy.resources.limits.")
            ))
            .with_data("serviceName", service.name.clone())
            .with_data("missing", missing.join(",")),
        );
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
    fn test_violation_no_limits() {
        let yaml = "services:\n  web:\n    image: nginx:1\n";
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "services.web");
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.contains("cpus or memory"));
    }

    #[test]
    fn test_no_violation_with_deploy_limits() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    deploy:
      resources:
        limits:
          cpus: "0.50"
          memory: 128M
"#;
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_legacy_keys_count() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    cpus: 0.5
    mem_limit: 256m
"#;
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_partial_limits() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    deploy:
      resources:
        limits:
          memory: 128M
"#;
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].data.get("missing").map(String::as_str), Some("cpus"));
    }
}
