//! Rule system framework.
//!
//! - `Rule` trait for all rules
//! - `SimpleRule` for stateless checks
//! - `FixableRule` for rules that can also rewrite the source text
//!
//! Rules are registered in a [`RuleRegistry`] and evaluated in
//! registration order. Each rule only reads the document, so the order has
//! no effect on the findings.

use crate::config::RuleConfig;
use crate::loader::ConfigDocument;
use crate::parser::{ComposeFile, Location, Node};
use crate::types::{Finding, RuleCategory, RuleCode, RuleMeta, Severity};

pub mod registry;

pub mod deprecated_syntax;
pub mod duplicate_port_mapping;
pub mod insecure_privilege;
pub mod missing_resource_limits;
pub mod no_build_and_image;
pub mod no_duplicate_container_names;
pub mod no_unbound_port_interfaces;
pub mod no_version_pin;
pub mod require_project_name_field;
pub mod require_quotes_in_ports;
pub mod service_container_name_regex;
pub mod valid_service_dependencies;

pub use registry::RuleRegistry;

const DOCS_URL: &str = "https://github.com/zavoloklom/docker-compose-linter/blob/main/docs/rules";

/// Documentation URL for a rule id.
pub fn docs_url(id: &str) -> String {
    format!("{}/{}-rule.md", DOCS_URL, id)
}

/// Context for running one rule over one document.
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    /// The merged document.
    pub document: &'a ConfigDocument,
    /// Typed view of the document.
    pub compose: &'a ComposeFile,
    /// The rule's configuration (options, overrides).
    pub config: &'a RuleConfig,
}

impl<'a> LintContext<'a> {
    pub fn new(document: &'a ConfigDocument, compose: &'a ComposeFile, config: &'a RuleConfig) -> Self {
        Self {
            document,
            compose,
            config,
        }
    }

    /// Display name of the file a location belongs to.
    pub fn file_name(&self, location: &Location) -> &'a str {
        self.document.source_name(location.file)
    }

    /// Raw tree node of a service.
    pub fn service_node(&self, name: &str) -> Option<&'a Node> {
        self.document.root.get("services")?.get(name)
    }
}

/// A rule that checks compose documents.
pub trait Rule: Send + Sync {
    /// The rule id (e.g., "no-version-pin").
    fn id(&self) -> &RuleCode;

    /// The default severity.
    fn severity(&self) -> Severity;

    fn category(&self) -> RuleCategory;

    /// Rule metadata (description, URL, version).
    fn meta(&self) -> &RuleMeta;

    /// Whether the rule runs when the configuration does not mention it.
    fn default_enabled(&self) -> bool {
        true
    }

    /// Whether this rule can auto-fix issues.
    fn is_fixable(&self) -> bool {
        false
    }

    /// Check the document and return any findings.
    fn check(&self, context: &LintContext) -> Vec<Finding>;

    /// Auto-fix the source content (if fixable).
    /// Returns the fixed content, or None if no fix was applied.
    fn fix(&self, _source: &str) -> Option<String> {
        None
    }
}

/// Base implementation for a simple (non-fixable) rule.
pub struct SimpleRule<F>
where
    F: Fn(&LintContext) -> Vec<Finding> + Send + Sync,
{
    id: RuleCode,
    severity: Severity,
    category: RuleCategory,
    meta: RuleMeta,
    default_enabled: bool,
    check_fn: F,
}

impl<F> SimpleRule<F>
where
    F: Fn(&LintContext) -> Vec<Finding> + Send + Sync,
{
    pub fn new(
        id: impl Into<RuleCode>,
        severity: Severity,
        category: RuleCategory,
        description: impl Into<String>,
        check_fn: F,
    ) -> Self {
        let id = id.into();
        let url = docs_url(id.as_str());
        Self {
            id,
            severity,
            category,
            meta: RuleMeta::new(description, url),
            default_enabled: true,
            check_fn,
        }
    }

    /// Opt-in rule: only runs when enabled by configuration.
    pub fn disabled_by_default(mut self) -> Self {
        self.default_enabled = false;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.meta = self.meta.with_version(version);
        self
    }
}

impl<F> Rule for SimpleRule<F>
where
    F: Fn(&LintContext) -> Vec<Finding> + Send + Sync,
{
    fn id(&self) -> &RuleCode {
        &self.id
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> RuleCategory {
        self.category
    }

    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    fn check(&self, context: &LintContext) -> Vec<Finding> {
        (self.check_fn)(context)
    }
}

/// Base implementation for a fixable rule.
pub struct FixableRule<C, X>
where
    C: Fn(&LintContext) -> Vec<Finding> + Send + Sync,
    X: Fn(&str) -> Option<String> + Send + Sync,
{
    id: RuleCode,
    severity: Severity,
    category: RuleCategory,
    meta: RuleMeta,
    default_enabled: bool,
    check_fn: C,
    fix_fn: X,
}

impl<C, X> FixableRule<C, X>
where
    C: Fn(&LintContext) -> Vec<Finding> + Send + Sync,
    X: Fn(&str) -> Option<String> + Send + Sync,
{
    pub fn new(
        id: impl Into<RuleCode>,
        severity: Severity,
        category: RuleCategory,
        description: impl Into<String>,
        check_fn: C,
        fix_fn: X,
    ) -> Self {
        let id = id.into();
        let url = docs_url(id.as_str());
        Self {
            id,
            severity,
            category,
            meta: RuleMeta::new(description, url),
            default_enabled: true,
            check_fn,
            fix_fn,
        }
    }

    /// Opt-in rule: only runs when enabled by configuration.
    pub fn disabled_by_default(mut self) -> Self {
        self.default_enabled = false;
        self
    }
}

impl<C, X> Rule for FixableRule<C, X>
where
    C: Fn(&LintContext) -> Vec<Finding> + Send + Sync,
    X: Fn(&str) -> Option<String> + Send + Sync,
{
    fn id(&self) -> &RuleCode {
        &self.id
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn category(&self) -> RuleCategory {
        self.category
    }

    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    fn is_fixable(&self) -> bool {
        true
    }

    fn check(&self, context: &LintContext) -> Vec<Finding> {
        (self.check_fn)(context)
    }

    fn fix(&self, source: &str) -> Option<String> {
        (self.fix_fn)(source)
    }
}

/// Helper to create a finding for a rule at a tree location.
pub fn make_finding(
    ctx: &LintContext,
    id: &str,
    severity: Severity,
    category: RuleCategory,
    message: impl Into<String>,
    location: &Location,
) -> Finding {
    Finding::new(
        id,
        severity,
        category,
        message,
        location.pos.line,
        location.pos.column,
    )
    .with_file(ctx.file_name(location))
    .with_path(location.path.clone())
}

/// Rule definition for documentation/introspection.
#[derive(Debug, Clone)]
pub struct RuleDefinition {
    pub id: RuleCode,
    pub severity: Severity,
    pub category: RuleCategory,
    pub description: String,
    pub url: String,
    pub version: u32,
    pub default_enabled: bool,
    pub fixable: bool,
}

impl RuleDefinition {
    pub fn of(rule: &dyn Rule) -> Self {
        Self {
            id: rule.id().clone(),
            severity: rule.severity(),
            category: rule.category(),
            description: rule.meta().description.clone(),
            url: rule.meta().url.clone(),
            version: rule.meta().version,
            default_enabled: rule.default_enabled(),
            fixable: rule.is_fixable(),
        }
    }
}
