//! Linter configuration.
//!
//! Supports the rule configuration forms accepted by `.dclintrc` files:
//! - `{ enabled, severity, options }` objects
//! - numeric levels (`0` off, `1` warning, `2` error)
//! - `[level, options]` arrays
//! - booleans and level names (`"off"`, `"info"`, `"warn"`, `"error"`)
//!
//! plus the global settings `threshold`, `schemaVersion`, `exclude` and
//! `disableIgnorePragma`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::SchemaVersion;
use crate::types::{RuleCode, Severity};

/// Config file names looked up by [`LintConfig::discover`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".dclintrc",
    ".dclintrc.json",
    ".dclintrc.yaml",
    ".dclintrc.yml",
    ".dclintrc.toml",
];

/// Configuration for a single rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleConfig {
    /// Overrides the rule's default-enabled flag.
    pub enabled: Option<bool>,
    /// Overrides the rule's default severity.
    pub severity: Option<Severity>,
    /// Rule-specific options.
    pub options: HashMap<String, serde_json::Value>,
}

impl RuleConfig {
    pub fn off() -> Self {
        Self {
            enabled: Some(false),
            ..Default::default()
        }
    }

    pub fn on() -> Self {
        Self {
            enabled: Some(true),
            ..Default::default()
        }
    }

    /// Enable the rule at the given severity.
    pub fn at(severity: Severity) -> Self {
        Self {
            enabled: Some(true),
            severity: Some(severity),
            ..Default::default()
        }
    }

    /// Add an option to the rule config.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Get a boolean option with a default value.
    pub fn get_bool_option(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Parse one entry of the `rules` table.
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(true) => Some(Self::on()),
            serde_json::Value::Bool(false) => Some(Self::off()),
            serde_json::Value::Number(_) | serde_json::Value::String(_) => level(value),
            serde_json::Value::Array(arr) => {
                let mut config = arr.first().and_then(level).unwrap_or_else(Self::on);
                if let Some(opts) = arr.get(1).and_then(|v| v.as_object()) {
                    for (k, v) in opts {
                        config.options.insert(k.clone(), v.clone());
                    }
                }
                Some(config)
            }
            serde_json::Value::Object(obj) => {
                let mut config = Self {
                    enabled: obj.get("enabled").and_then(|v| v.as_bool()),
                    severity: obj.get("severity").and_then(|v| v.as_str()).and_then(Severity::parse),
                    options: HashMap::new(),
                };
                if let Some(opts) = obj.get("options").and_then(|v| v.as_object()) {
                    for (k, v) in opts {
                        config.options.insert(k.clone(), v.clone());
                    }
                }
                Some(config)
            }
            serde_json::Value::Null => None,
        }
    }
}

/// Parse a numeric or named level.
fn level(value: &serde_json::Value) -> Option<RuleConfig> {
    if let Some(n) = value.as_u64() {
        return match n {
            0 => Some(RuleConfig::off()),
            1 => Some(RuleConfig::at(Severity::Warning)),
            2 => Some(RuleConfig::at(Severity::Error)),
            _ => None,
        };
    }
    match value.as_str()? {
        "off" => Some(RuleConfig::off()),
        "on" => Some(RuleConfig::on()),
        name => Severity::parse(name).map(RuleConfig::at),
    }
}

/// Main configuration for a lint run.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Per-rule configuration, keyed by rule id.
    pub rules: HashMap<String, RuleConfig>,
    /// Findings at or above this severity fail the run.
    pub threshold: Severity,
    /// Schema version override.
    pub schema_version: Option<SchemaVersion>,
    /// File patterns to exclude from linting.
    pub exclude: Vec<String>,
    /// Whether to disable pragma (comment-based) ignores.
    pub disable_ignore_pragma: bool,
    /// Whether to report fixable issues only.
    pub fixable_only: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            threshold: Severity::Error,
            schema_version: None,
            exclude: Vec::new(),
            disable_ignore_pragma: false,
            fixable_only: false,
        }
    }
}

impl LintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold.
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = Some(version);
        self
    }

    /// Add an exclude pattern.
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Configure a specific rule.
    pub fn with_rule(mut self, rule: impl Into<String>, config: RuleConfig) -> Self {
        self.rules.insert(rule.into(), config);
        self
    }

    /// Disable a rule.
    pub fn disable(mut self, rule: impl Into<String>) -> Self {
        self.rules.entry(rule.into()).or_default().enabled = Some(false);
        self
    }

    /// Enable a rule that is off by default.
    pub fn enable(mut self, rule: impl Into<String>) -> Self {
        self.rules.entry(rule.into()).or_default().enabled = Some(true);
        self
    }

    /// Override a rule's severity.
    pub fn with_severity(mut self, rule: impl Into<String>, severity: Severity) -> Self {
        self.rules.entry(rule.into()).or_default().severity = Some(severity);
        self
    }

    /// Disable pragma (comment-based) ignores.
    pub fn with_disable_ignore_pragma(mut self, disable: bool) -> Self {
        self.disable_ignore_pragma = disable;
        self
    }

    /// Report fixable issues only.
    pub fn with_fixable_only(mut self, fixable_only: bool) -> Self {
        self.fixable_only = fixable_only;
        self
    }

    /// Get the configuration for a specific rule.
    pub fn rule_config(&self, code: &str) -> Option<&RuleConfig> {
        self.rules.get(code)
    }

    /// Whether a rule runs, given its default-enabled flag.
    pub fn is_rule_enabled(&self, code: &RuleCode, default_enabled: bool) -> bool {
        self.rules
            .get(code.as_str())
            .and_then(|c| c.enabled)
            .unwrap_or(default_enabled)
    }

    /// Get the effective severity for a rule, applying any overrides.
    pub fn effective_severity(&self, code: &RuleCode, default: Severity) -> Severity {
        self.rules
            .get(code.as_str())
            .and_then(|c| c.severity)
            .unwrap_or(default)
    }

    /// Whether a finding of this severity fails the run.
    pub fn fails(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// Check if a file path should be excluded.
    pub fn is_excluded(&self, path: &str) -> bool {
        for pattern in &self.exclude {
            if pattern.contains('*') {
                let pattern_regex = regex::escape(pattern).replace("\\*", ".*");
                if let Ok(re) = regex::Regex::new(&format!("^{}$", pattern_regex))
                    && (re.is_match(path) || file_name(path).is_some_and(|name| re.is_match(name)))
                {
                    return true;
                }
            } else if path.contains(pattern.as_str()) {
                return true;
            }
        }
        false
    }

    /// Load a config file. JSON, YAML and TOML are recognised by extension;
    /// files without a known extension are read as YAML (a JSON superset).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let parse_err = |message: String| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        };
        let value: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
            Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
            _ => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        };

        log::debug!("Loaded config from {}", path.display());
        Ok(LintConfigBuilder::new().from_json(&value)?.build())
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

fn file_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}

/// Builder for creating a [`LintConfig`] from a JSON value.
pub struct LintConfigBuilder {
    config: LintConfig,
}

impl LintConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: LintConfig::default(),
        }
    }

    /// Apply a configuration document.
    pub fn from_json(mut self, json: &serde_json::Value) -> Result<Self, ConfigError> {
        if !json.is_object() && !json.is_null() {
            return Err(ConfigError::Invalid("configuration must be a mapping".to_string()));
        }

        if let Some(rules) = json.get("rules").and_then(|v| v.as_object()) {
            for (name, value) in rules {
                match RuleConfig::from_json(value) {
                    Some(rule_config) => {
                        self.config.rules.insert(name.clone(), rule_config);
                    }
                    None => log::warn!("Ignoring unrecognised configuration for rule {}: {}", name, value),
                }
            }
        }

        if let Some(threshold) = json.get("threshold").and_then(|v| v.as_str()) {
            self.config.threshold = Severity::parse(threshold)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown threshold \"{}\"", threshold)))?;
        }

        if let Some(version) = json.get("schemaVersion") {
            let text = match version {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.config.schema_version = Some(
                SchemaVersion::parse(&text)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown schema version \"{}\"", text)))?,
            );
        }

        if let Some(exclude) = json.get("exclude").and_then(|v| v.as_array()) {
            self.config.exclude = exclude
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }

        if let Some(disable) = json.get("disableIgnorePragma").and_then(|v| v.as_bool()) {
            self.config.disable_ignore_pragma = disable;
        }

        if let Some(fixable_only) = json.get("fixableOnly").and_then(|v| v.as_bool()) {
            self.config.fixable_only = fixable_only;
        }

        Ok(self)
    }

    /// Build the final configuration.
    pub fn build(self) -> LintConfig {
        self.config
    }
}

impl Default for LintConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LintConfig::default();
        assert_eq!(config.threshold, Severity::Error);
        assert!(config.exclude.is_empty());
        assert!(config.rules.is_empty());
        assert!(config.schema_version.is_none());
    }

    #[test]
    fn test_rule_enabled() {
        let config = LintConfig::default()
            .disable("no-version-pin")
            .enable("require-project-name-field");

        assert!(!config.is_rule_enabled(&RuleCode::new("no-version-pin"), true));
        assert!(config.is_rule_enabled(&RuleCode::new("require-project-name-field"), false));
        // Not configured: default applies
        assert!(config.is_rule_enabled(&RuleCode::new("insecure-privilege"), true));
        assert!(!config.is_rule_enabled(&RuleCode::new("require-quotes-in-ports"), false));
    }

    #[test]
    fn test_effective_severity() {
        let config = LintConfig::default().with_severity("no-version-pin", Severity::Error);

        assert_eq!(
            config.effective_severity(&RuleCode::new("no-version-pin"), Severity::Warning),
            Severity::Error
        );
        assert_eq!(
            config.effective_severity(&RuleCode::new("insecure-privilege"), Severity::Warning),
            Severity::Warning
        );
    }

    #[test]
    fn test_threshold() {
        let config = LintConfig::default();
        assert!(config.fails(Severity::Error));
        assert!(!config.fails(Severity::Warning));

        let config = config.with_threshold(Severity::Warning);
        assert!(config.fails(Severity::Warning));
        assert!(!config.fails(Severity::Info));
    }

    #[test]
    fn test_exclude_patterns() {
        let config = LintConfig::default()
            .with_exclude("node_modules")
            .with_exclude("*.test.yml");

        assert!(config.is_excluded("path/to/node_modules/compose.yml"));
        assert!(config.is_excluded("docker-compose.test.yml"));
        assert!(config.is_excluded("deploy/docker-compose.test.yml"));
        assert!(!config.is_excluded("docker-compose.yml"));
    }

    #[test]
    fn test_config_from_json() {
        let json = serde_json::json!({
            "rules": {
                "no-build-and-image": 2,
                "no-version-pin": [1, { "disallowLatest": true }],
                "missing-resource-limits": 0,
                "insecure-privilege": { "severity": "error", "options": {} },
                "require-project-name-field": true,
                "deprecated-syntax": "info"
            },
            "threshold": "warning",
            "schemaVersion": 3,
            "exclude": ["*.test.yml"],
            "disableIgnorePragma": true
        });

        let config = LintConfigBuilder::new().from_json(&json).unwrap().build();

        assert_eq!(config.threshold, Severity::Warning);
        assert_eq!(config.schema_version, Some(SchemaVersion::V3));
        assert_eq!(config.exclude, vec!["*.test.yml"]);
        assert!(config.disable_ignore_pragma);

        let rule = config.rule_config("no-build-and-image").unwrap();
        assert_eq!(rule.severity, Some(Severity::Error));

        let rule = config.rule_config("no-version-pin").unwrap();
        assert_eq!(rule.severity, Some(Severity::Warning));
        assert!(rule.get_bool_option("disallowLatest", false));

        assert_eq!(config.rule_config("missing-resource-limits").unwrap().enabled, Some(false));

        let rule = config.rule_config("insecure-privilege").unwrap();
        assert_eq!(rule.enabled, None);
        assert_eq!(rule.severity, Some(Severity::Error));

        assert_eq!(config.rule_config("require-project-name-field").unwrap().enabled, Some(true));
        assert_eq!(config.rule_config("deprecated-syntax").unwrap().severity, Some(Severity::Info));
    }

    #[test]
    fn test_invalid_threshold() {
        let json = serde_json::json!({ "threshold": "fatal" });
        assert!(matches!(
            LintConfigBuilder::new().from_json(&json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_file_formats() {
        let dir = tempfile::TempDir::new().unwrap();

        let yaml = dir.path().join(".dclintrc.yaml");
        std::fs::write(&yaml, "rules:\n  no-version-pin: 0\nthreshold: info\n").unwrap();
        let config = LintConfig::from_file(&yaml).unwrap();
        assert_eq!(config.threshold, Severity::Info);
        assert!(!config.is_rule_enabled(&RuleCode::new("no-version-pin"), true));

        let toml = dir.path().join(".dclintrc.toml");
        std::fs::write(&toml, "threshold = \"warning\"\n\n[rules.no-version-pin]\nseverity = \"error\"\n").unwrap();
        let config = LintConfig::from_file(&toml).unwrap();
        assert_eq!(config.threshold, Severity::Warning);
        assert_eq!(
            config.effective_severity(&RuleCode::new("no-version-pin"), Severity::Warning),
            Severity::Error
        );

        let json = dir.path().join(".dclintrc.json");
        std::fs::write(&json, "{ not json").unwrap();
        assert!(matches!(LintConfig::from_file(&json), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(LintConfig::discover(dir.path()).is_none());

        std::fs::write(dir.path().join(".dclintrc.yml"), "rules: {}\n").unwrap();
        let found = LintConfig::discover(dir.path()).unwrap();
        assert!(found.ends_with(".dclintrc.yml"));
    }
}
