//! valid-service-dependencies
//!
//! Every `depends_on` entry must name a service of the project, and a
//! `service_healthy` condition needs a healthcheck on the target service.

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "valid-service-dependencies";
const DESCRIPTION: &str = "Service dependencies must exist and be able to report health when waited on.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Warning, RuleCategory::BestPractice, DESCRIPTION, check)
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    for service in &ctx.compose.services {
        for dependency in &service.depends_on {
            let finding = match ctx.compose.service(&dependency.service) {
                None => make_finding(
                    ctx,
                    ID,
                    Severity::Warning,
                    RuleCategory::BestPractice,
                    format!(
                        "Service \"{}\" depends on undefined service \"{}\".",
                        service.name, dependency.service
                    ),
                    &dependency.location,
                ),
                Some(target)
                    if dependency.condition.as_deref() == Some("service_healthy") && !target.has_healthcheck =>
                {
                    make_finding(
                        ctx,
                        ID,
                        Severity::Warning,
                        RuleCategory::BestPractice,
                        format!(
                            "Service \"{}\" waits for \"{}\" to be healthy, but \"{}\" has no healthcheck.",
                            service.name, dependency.service, dependency.service
                        ),
                        &dependency.location,
                    )
                    .with_suggestion(format!("Add a healthcheck to service \"{}\".", dependency.service))
                }
                Some(_) => continue,
            };
            findings.push(
                finding
                    .with_data("serviceName", service.name.clone())
                    .with_data("dependency", dependency.service.clone()),
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
    fn test_defined_dependencies() {
        let yaml = r#"
services:
  web:
    image: web:1
    depends_on:
      db:
        condition: service_healthy
      cache:
        condition: service_started
  db:
    image: postgres:16
    healthcheck:
      test: ["CMD", "pg_isready"]
  cache:
    image: redis:7
"#;
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_undefined_dependency() {
        let yaml = r#"
services:
  web:
    image: web:1
    depends_on: [db, queue]
  db:
    image: postgres:16
"#;
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "services.web.depends_on[1]");
        assert!(findings[0].message.contains("\"queue\""));
    }

    #[test]
    fn test_healthy_condition_without_healthcheck() {
        let yaml = r#"
services:
  web:
    image: web:1
    depends_on:
      db:
        condition: service_healthy
  db:
    image: postgres:16
    healthcheck:
      disable: true
"#;
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "services.web.depends_on.db");
        assert_eq!(findings[0].line, 6);
        assert!(findings[0].message.contains("no healthcheck"));
    }
}
