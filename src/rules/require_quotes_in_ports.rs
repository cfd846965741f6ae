//! require-quotes-in-ports
//!
//! Short-syntax port mappings should be quoted: YAML 1.1 parsers read
//! `60:60` as a base-60 integer.

use crate::rules::{FixableRule, LintContext, Rule, make_finding};
use crate::types::{Finding, RuleCategory, Severity};

const ID: &str = "require-quotes-in-ports";
const DESCRIPTION: &str = "Port mappings should be quoted to avoid YAML parsing issues.";

pub fn rule() -> impl Rule {
    FixableRule::new(ID, Severity::Warning, RuleCategory::Style, DESCRIPTION, check, fix).disabled_by_default()
}

fn check(ctx: &LintContext) -> Vec<Finding> {
    let mut findings = Vec::new();

    for service in &ctx.compose.services {
        for port in &service.ports {
            if !port.short_syntax || port.quoted {
                continue;
            }
            let message = format!(
                "Port mapping \"{}\" in service \"{}\" should be quoted.",
                port.raw, service.name
            );
            findings.push(
                make_finding(
                    ctx,
                    ID,
                    Severity::Warning,
                    RuleCategory::Style,
                    message,
                    &port.location,
                )
                .with_fixable(true)
                .with_data("serviceName", service.name.clone())
                .with_data("port", port.raw.clone()),
            );
        }
    }

    findings
}

fn fix(source: &str) -> Option<String> {
    let mut result = String::with_capacity(source.len() + 16);
    let mut modified = false;
    let mut ports_indent: Option<usize> = None;

    for line in source.lines() {
        let trimmed = line.trim();
        let indent = line.len() - line.trim_start().len();

        if trimmed.starts_with("ports:") {
            ports_indent = Some(indent);
            result.push_str(line);
            result.push('\n');
            continue;
        }

        // Leave the section on the next key at the same or lower indent.
        if let Some(section) = ports_indent {
            if !trimmed.is_empty() && !trimmed.starts_with('#') && indent <= section && !trimmed.starts_with('-') {
                ports_indent = None;
            }
        }

        if ports_indent.is_some() {
            if let Some(rewritten) = quote_item(line, indent) {
                result.push_str(&rewritten);
                result.push('\n');
                modified = true;
                continue;
            }
        }

        result.push_str(line);
        result.push('\n');
    }

    if !modified {
        return None;
    }
    if !source.ends_with('\n') {
        result.pop();
    }
    Some(result)
}

/// Rewrite `- 8080:80  # comment` as `- "8080:80"  # comment`.
fn quote_item(line: &str, indent: usize) -> Option<String> {
    let item = line.trim_start().strip_prefix('-')?;
    let value = item.trim_start();
    if value.is_empty() || value.starts_with(['"', '\'', '{', '[', '&', '*']) {
        return None;
    }
    // Long-syntax entries start with a key: `- target: 80`.
    if value.contains(": ") || value.ends_with(':') {
        return None;
    }

    let (value, comment) = match value.find(" #") {
        Some(idx) => (value[..idx].trim_end(), &value[idx..]),
        None => (value.trim_end(), ""),
    };
    Some(format!("{}- \"{}\"{}", " ".repeat(indent), value, comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run;

    fn check_yaml(yaml: &str) -> Vec<Finding> {
        run(check, yaml)
    }

    #[test]
    fn test_quoted_ports_pass() {
        let yaml = r#"
services:
  web:
    image: nginx
    ports:
      - "8080:80"
      - '9000'
      - target: 443
        published: 8443
"#;
        assert!(check_yaml(yaml).is_empty());
    }

    #[test]
    fn test_unquoted_ports() {
        let yaml = r#"
services:
  web:
    image: nginx
    ports:
      - 8080:80
      - 80
"#;
        let findings = check_yaml(yaml);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.fixable));
        assert_eq!(findings[0].path, "services.web.ports[0]");
    }

    #[test]
    fn test_fix_adds_quotes() {
        let yaml = "services:\n  web:\n    image: nginx\n    ports:\n      - 8080:80 # http\n      - target: 443\n    restart: always\n";
        let fixed = fix(yaml).unwrap();
        assert_eq!(
            fixed,
            "services:\n  web:\n    image: nginx\n    ports:\n      - \"8080:80\" # http\n      - target: 443\n    restart: always\n"
        );
    }

    #[test]
    fn test_fix_no_change_already_quoted() {
        let yaml = "services:\n  web:\n    ports:\n      - \"8080:80\"\n";
        assert!(fix(yaml).is_none());
    }

    #[test]
    fn test_fix_leaves_other_sequences() {
        let yaml = "services:\n  web:\n    ports:\n      - 80\n    command:\n      - run\n";
        let fixed = fix(yaml).unwrap();
        assert!(fixed.contains("- \"80\""));
        assert!(fixed.contains("      - run\n"));
    }
}
