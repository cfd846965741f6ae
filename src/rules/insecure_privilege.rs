//! insecure-privilege
//!
//! Flags `privileged: true`, and services that publish ports (with or
//! without an explicit host port) without `no-new-privileges` in
//! `security_opt`. `expose`-only services are not published.

use crate::rules::{LintContext, Rule, SimpleRule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "insecure-privilege";
const DESCRIPTION: &str = "Services should not run privileged and should set no-new-privileges when exposed.";

pub fn rule() -> impl Rule {
    SimpleRule::new(ID, Severity::Warning, RuleCategory::Security, DESCRIPTION, check)
}

/// Whether `security_opt` turns on no-new-privileges.
fn has_no_new_privileges(options: &[String]) -> bool {
    options.iter().any(|opt| {
        let opt = opt.trim();
        match opt.strip_prefix("no-new-privileges") {
            Some("") => true,
            Some(rest) => matches!(rest.trim_start_matches([':', '=']), "true" | "1"),
            None => false,
        }
    })
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    for service in &ctx.compose.services {
        if let Some(privileged) = &service.privileged
            && privileged.value
        {
            findings.push(
                make_finding(
                    ctx,
                    ID,
                    Severity::Warning,
                    RuleCategory::Security,
                    format!("Service \"{}\" runs in privileged mode.", service.name),
                    &privileged.location,
                )
                .with_suggestion("Remove \"privileged: true\" and grant only the capabilities needed via cap_add.")
                .with_data("serviceName", service.name.clone()),
            );
        }

        if service.publishes_ports() && !has_no_new_privileges(&service.security_opt) {
            let location = match ctx.service_node(&service.name) {
                Some(node) => service.key_location("ports", node),
                None => service.location.clone(),
            };
            findings.push(
                make_finding(
                    ctx,
                    ID,
                    Severity::Warning,
                    RuleCategory::Security,
                    format!(
                        "Service \"{}\" publishes ports without \"no-new-privileges\" in security_opt.",
                        service.name
                    ),
                    &location,
                )
                .with_suggestion("Add \"no-new-privileges:true\" to security_opt.")
                .with_data("serviceName", service.name.clone()),
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
    fn test_privileged() {
        let yaml = "services:\n  web:\n    image: nginx:1\n    privileged: true\n";
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "services.web.privileged");
        assert_eq!(findings[0].line, 4);
    }

    #[test]
    fn test_privileged_false_ok() {
        let yaml = "services:\n  web:\n    image: nginx:1\n    privileged: false\n";
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_published_ports_without_no_new_privileges() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    ports:
      - "8080:80"
  ephemeral:
    image: worker:1
    ports:
      - "9000"
      - target: 9001
  internal:
    image: worker:1
    expose:
      - "9000"
"#;
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].path, "services.web.ports");
        assert_eq!(findings[0].line, 5);
        assert_eq!(findings[1].path, "services.ephemeral.ports");
        assert_eq!(findings[1].line, 9);
    }

    #[test]
    fn test_no_new_privileges_set() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    ports:
      - "8080:80"
    security_opt:
      - no-new-privileges:true
"#;
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_both_findings_on_one_service() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    privileged: true
    ports:
      - "80:80"
    security_opt:
      - no-new-privileges:false
"#;
        assert_eq!(check_yaml(yaml).len(), 2);
    }

    #[test]
    fn test_option_forms() {
        let opts = |s: &str| vec![s.to_string()];
        assert!(has_no_new_privileges(&opts("no-new-privileges")));
        assert!(has_no_new_privileges(&opts("no-new-privileges=true")));
        assert!(!has_no_new_privileges(&opts("no-new-privileges:false")));
        assert!(!has_no_new_privileges(&opts("seccomp:unconfined")));
    }
}
