//! Per-document linting: schema validation plus rule evaluation.

use std::path::Path;

use crate::config::LintConfig;
use crate::error::LoadError;
use crate::loader::{ConfigDocument, load_str};
use crate::parser::ComposeFile;
use crate::pragma::{self, Pragmas};
use crate::rules::RuleRegistry;
use crate::schema;
use crate::types::Finding;

/// Lint a loaded document with every enabled rule in `registry`.
///
/// Schema validation and the rule engine run side by side on the shared
/// tree. Findings come back sorted.
pub fn lint_document(document: &ConfigDocument, registry: &RuleRegistry, config: &LintConfig) -> Vec<Finding> {
    let pragmas = if config.disable_ignore_pragma {
        Pragmas::default()
    } else {
        pragma::parse(&document.text)
    };
    if pragmas.disables_file() {
        log::debug!("{}: disabled by pragma", document.name);
        return Vec::new();
    }

    let (schema_findings, rule_findings) = rayon::join(
        || schema_findings(document, config),
        || {
            let compose = ComposeFile::from_root(&document.root);
            registry.evaluate(document, &compose, config)
        },
    );

    let mut findings: Vec<Finding> = schema_findings
        .into_iter()
        .chain(rule_findings)
        // Pragmas only see the input's own lines, not included files.
        .filter(|f| f.file != document.name || !pragmas.suppresses(&f.rule_id, f.line))
        .filter(|f| !config.fixable_only || f.fixable)
        .collect();

    findings.sort();
    log::debug!("{}: {} finding(s)", document.name, findings.len());
    findings
}

/// Schema findings with the per-rule enable/severity overrides applied.
fn schema_findings(document: &ConfigDocument, config: &LintConfig) -> Vec<Finding> {
    schema::validate(document, config.schema_version)
        .into_iter()
        .filter(|f| config.is_rule_enabled(&f.rule_id, true))
        .map(|mut f| {
            f.severity = config.effective_severity(&f.rule_id, f.severity);
            f
        })
        .collect()
}

/// Lint compose text with the built-in rules.
pub fn lint_str(content: &str, name: &str, config: &LintConfig) -> Result<Vec<Finding>, LoadError> {
    let document = load_str(content, name, Path::new("."))?;
    Ok(lint_document(&document, &RuleRegistry::with_builtins(), config))
}

/// Apply the text rewrites of every enabled fixable rule.
///
/// Returns `content` unchanged when a `dclint-disable-file` pragma covers
/// the whole file.
pub fn fix_content(content: &str, registry: &RuleRegistry, config: &LintConfig) -> String {
    if !config.disable_ignore_pragma && pragma::parse(content).disables_file() {
        return content.to_string();
    }

    let mut fixed = content.to_string();
    for rule in registry.iter() {
        if !rule.is_fixable() || !config.is_rule_enabled(rule.id(), rule.default_enabled()) {
            continue;
        }
        if let Some(new_content) = rule.fix(&fixed) {
            log::debug!("applied fix from {}", rule.id());
            fixed = new_content;
        }
    }

    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn rule_ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[test]
    fn test_lint_clean_document() {
        let yaml = r#"
name: shop
services:
  web:
    image: nginx:1.25
    ports:
      - "127.0.0.1:8080:80"
    security_opt:
      - no-new-privileges:true
    deploy:
      resources:
        limits:
          cpus: "0.5"
          memory: 256M
"#;
        let findings = lint_str(yaml, "compose.yml", &LintConfig::default()).unwrap();
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn test_single_unpinned_image() {
        let yaml = "services:\n  web:\n    image: nginx\n";
        let config = LintConfig::default().disable("missing-resource-limits");
        let findings = lint_str(yaml, "compose.yml", &config).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id.as_str(), "no-version-pin");
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].path, "services.web.image");
    }

    #[test]
    fn test_schema_and_rules_together() {
        let yaml = r#"
services:
  web:
    build: .
    image: app:1
    ports: "8080:80"
"#;
        let config = LintConfig::default().disable("missing-resource-limits");
        let findings = lint_str(yaml, "compose.yml", &config).unwrap();
        let ids = rule_ids(&findings);
        assert!(ids.contains(&"no-build-and-image"));
        assert!(ids.contains(&"schema.type"));
    }

    #[test]
    fn test_schema_rule_overrides() {
        let yaml = "services:\n  web:\n    image: nginx:1\n    bogus: 1\n";
        let base = LintConfig::default().disable("missing-resource-limits");

        let findings = lint_str(yaml, "compose.yml", &base).unwrap();
        assert_eq!(rule_ids(&findings), vec!["schema.unknown-key"]);
        assert_eq!(findings[0].severity, Severity::Warning);

        let raised = base.clone().with_severity("schema.unknown-key", Severity::Error);
        assert_eq!(lint_str(yaml, "compose.yml", &raised).unwrap()[0].severity, Severity::Error);

        let off = base.disable("schema.unknown-key");
        assert!(lint_str(yaml, "compose.yml", &off).unwrap().is_empty());
    }

    #[test]
    fn test_pragmas() {
        let yaml = r#"
services:
  web:
    # dclint-disable-next-line no-version-pin
    image: nginx
  api:
    image: redis # dclint-disable-line
"#;
        let config = LintConfig::default().disable("missing-resource-limits");
        assert!(lint_str(yaml, "compose.yml", &config).unwrap().is_empty());

        let ignored = config.with_disable_ignore_pragma(true);
        assert_eq!(lint_str(yaml, "compose.yml", &ignored).unwrap().len(), 2);
    }

    #[test]
    fn test_disable_file_pragma() {
        let yaml = "# dclint-disable-file\nservices:\n  web:\n    image: nginx\n";
        assert!(lint_str(yaml, "compose.yml", &LintConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_fixable_only() {
        let yaml = "version: \"3\"\nservices:\n  web:\n    image: nginx\n";
        let config = LintConfig::default().with_fixable_only(true);
        let findings = lint_str(yaml, "compose.yml", &config).unwrap();
        assert_eq!(rule_ids(&findings), vec!["deprecated-syntax"]);
    }

    #[test]
    fn test_deterministic() {
        let yaml = "services:\n  a:\n    image: x\n    ports: [\"80:80\"]\n  b:\n    image: y\n    ports: [\"80:80\"]\n";
        let config = LintConfig::default();
        let first = lint_str(yaml, "compose.yml", &config).unwrap();
        let second = lint_str(yaml, "compose.yml", &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fix_content() {
        let registry = RuleRegistry::with_builtins();
        let yaml = "version: \"3.8\"\n\nservices:\n  web:\n    ports:\n      - 8080:80\n";

        let fixed = fix_content(yaml, &registry, &LintConfig::default());
        assert_eq!(fixed, "services:\n  web:\n    ports:\n      - 8080:80\n");

        let config = LintConfig::default().enable("require-quotes-in-ports");
        let fixed = fix_content(yaml, &registry, &config);
        assert_eq!(fixed, "services:\n  web:\n    ports:\n      - \"8080:80\"\n");

        let config = LintConfig::default().disable("deprecated-syntax");
        assert_eq!(fix_content(yaml, &registry, &config), yaml);
    }

    #[test]
    fn test_fix_respects_disable_file() {
        let registry = RuleRegistry::with_builtins();
        let yaml = "# dclint-disable-file\nversion: \"3\"\nservices: {}\n";
        assert_eq!(fix_content(yaml, &registry, &LintConfig::default()), yaml);
    }
}
