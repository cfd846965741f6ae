//! Rule registry for managing lint rules.
//!
//! The [`RuleRegistry`] stores the available rules in registration order
//! and evaluates the enabled ones against a document.

use std::collections::HashMap;

use crate::config::{LintConfig, RuleConfig};
use crate::loader::ConfigDocument;
use crate::parser::ComposeFile;
use crate::rules::{self, LintContext, Rule, RuleDefinition};
use crate::types::Finding;

/// Registry of lint rules, keyed by id.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a registry with all built-in rules.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(rules::no_version_pin::rule()));
        registry.register(Box::new(rules::missing_resource_limits::rule()));
        registry.register(Box::new(rules::deprecated_syntax::rule()));
        registry.register(Box::new(rules::duplicate_port_mapping::rule()));
        registry.register(Box::new(rules::insecure_privilege::rule()));
        registry.register(Box::new(rules::no_build_and_image::rule()));
        registry.register(Box::new(rules::no_duplicate_container_names::rule()));
        registry.register(Box::new(rules::no_unbound_port_interfaces::rule()));
        registry.register(Box::new(rules::require_project_name_field::rule()));
        registry.register(Box::new(rules::service_container_name_regex::rule()));
        registry.register(Box::new(rules::require_quotes_in_ports::rule()));
        registry.register(Box::new(rules::valid_service_dependencies::rule()));
        registry
    }

    /// Register a rule. A rule with the same id replaces the earlier one
    /// in place.
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        let id = rule.id().as_str().to_string();
        match self.index.get(&id) {
            Some(&idx) => self.rules[idx] = rule,
            None => {
                self.index.insert(id, self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    /// Get a rule by id.
    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.index.get(id).map(|&idx| self.rules[idx].as_ref())
    }

    /// Iterate over all rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule definitions for documentation.
    pub fn definitions(&self) -> Vec<RuleDefinition> {
        self.iter().map(RuleDefinition::of).collect()
    }

    /// Run every enabled rule and apply configured severity overrides.
    pub fn evaluate(&self, document: &ConfigDocument, compose: &ComposeFile, config: &LintConfig) -> Vec<Finding> {
        let defaults = RuleConfig::default();
        let mut findings = Vec::new();

        for rule in self.iter() {
            if !config.is_rule_enabled(rule.id(), rule.default_enabled()) {
                continue;
            }
            let rule_config = config.rule_config(rule.id().as_str()).unwrap_or(&defaults);
            let ctx = LintContext::new(document, compose, rule_config);
            let severity = config.effective_severity(rule.id(), rule.severity());

            let mut produced = rule.check(&ctx);
            log::trace!("{}: {} finding(s) from {}", document.name, produced.len(), rule.id());
            for finding in &mut produced {
                finding.severity = severity;
            }
            findings.extend(produced);
        }

        findings
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::loader::load_str;
    use crate::rules::SimpleRule;
    use crate::types::{RuleCategory, Severity};

    fn evaluate(yaml: &str, config: &LintConfig) -> Vec<Finding> {
        let document = load_str(yaml, "compose.yml", Path::new(".")).unwrap();
        let compose = ComposeFile::from_root(&document.root);
        RuleRegistry::with_builtins().evaluate(&document, &compose, config)
    }

    #[test]
    fn test_builtins() {
        let registry = RuleRegistry::with_builtins();
        assert_eq!(registry.len(), 12);
        assert!(!registry.is_empty());
        assert!(registry.get("no-version-pin").is_some());
        assert!(registry.get("DCL001").is_none());

        let ids: Vec<&str> = registry.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids[0], "no-version-pin");
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len(), "rule ids should be unique");
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = RuleRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(SimpleRule::new(
            "custom",
            Severity::Info,
            RuleCategory::Style,
            "first",
            |_: &LintContext| Vec::new(),
        )));
        registry.register(Box::new(SimpleRule::new(
            "custom",
            Severity::Error,
            RuleCategory::Style,
            "second",
            |_: &LintContext| Vec::new(),
        )));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("custom").unwrap().severity(), Severity::Error);
    }

    #[test]
    fn test_disabled_rules_contribute_nothing() {
        let yaml = "services:\n  web:\n    image: nginx\n";
        let enabled = evaluate(yaml, &LintConfig::default());
        assert!(enabled.iter().any(|f| f.rule_id.as_str() == "no-version-pin"));

        let disabled = evaluate(yaml, &LintConfig::default().disable("no-version-pin"));
        assert!(disabled.iter().all(|f| f.rule_id.as_str() != "no-version-pin"));
    }

    #[test]
    fn test_default_disabled_rules_opt_in() {
        let yaml = "services:\n  web:\n    image: nginx:1\n";
        let findings = evaluate(yaml, &LintConfig::default());
        assert!(findings.iter().all(|f| f.rule_id.as_str() != "require-project-name-field"));

        let findings = evaluate(yaml, &LintConfig::default().enable("require-project-name-field"));
        assert!(findings.iter().any(|f| f.rule_id.as_str() == "require-project-name-field"));
    }

    #[test]
    fn test_severity_override() {
        let yaml = "services:\n  web:\n    image: nginx\n";
        let config = LintConfig::default().with_severity("no-version-pin", Severity::Error);
        let findings = evaluate(yaml, &config);
        let pin = findings
            .iter()
            .find(|f| f.rule_id.as_str() == "no-version-pin")
            .unwrap();
        assert_eq!(pin.severity, Severity::Error);
    }

    #[test]
    fn test_definitions() {
        let defs = RuleRegistry::with_builtins().definitions();
        assert_eq!(defs.len(), 12);
        assert!(defs.iter().all(|d| d.url.ends_with("-rule.md")));
    }
}
