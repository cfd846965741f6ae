//! Structural validation of compose documents.
//!
//! Walks the merged tree top-down against the field tables in
//! [`definitions`]. Violations are reported as `schema.*` findings; the
//! validator never fails and visits keys in document order, so the same
//! document always yields the same sequence of findings.

pub mod definitions;

use std::fmt;

use crate::loader::ConfigDocument;
use crate::parser::{Location, Node, NodeKind};
use crate::types::{Finding, RuleCategory, Severity};

use definitions::{Kind, ROOT, Spec};

pub const REQUIRED: &str = "schema.required";
pub const TYPE: &str = "schema.type";
pub const ENUM: &str = "schema.enum";
pub const UNKNOWN_KEY: &str = "schema.unknown-key";
pub const VERSION: &str = "schema.version";

/// Compose file format the document is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SchemaVersion {
    /// Legacy format 2.x.
    V2,
    /// Legacy format 3.x.
    V3,
    /// The Compose Specification (current).
    #[default]
    Spec,
}

impl SchemaVersion {
    /// Parse a version name: `2`, `3`, `spec`, or a legacy `version` value like `3.8`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "spec" | "latest" | "compose-spec" => return Some(Self::Spec),
            _ => {}
        }
        let major = s.split('.').next()?;
        match major {
            "2" => Some(Self::V2),
            "3" => Some(Self::V3),
            _ => None,
        }
    }

    /// Detect the version from a document's `version` key.
    ///
    /// Returns the version plus the raw value when it was not recognised.
    pub fn detect(root: &Node) -> (Self, Option<String>) {
        match root.get("version").and_then(Node::text) {
            None => (Self::Spec, None),
            Some(text) => match Self::parse(text) {
                Some(version) => (version, None),
                None => (Self::Spec, Some(text.to_string())),
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "2",
            Self::V3 => "3",
            Self::Spec => "spec",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a document. An explicit `version` overrides detection.
pub fn validate(doc: &ConfigDocument, version: Option<SchemaVersion>) -> Vec<Finding> {
    let (detected, unrecognised) = SchemaVersion::detect(&doc.root);
    let version = version.unwrap_or(detected);
    let mut validator = Validator {
        doc,
        version,
        findings: Vec::new(),
    };

    if let Some(raw) = unrecognised {
        let location = doc
            .root
            .entry("version")
            .map(|e| Location::new(e.value.file, e.value.pos, "version"))
            .unwrap_or_default();
        let message = format!(
            "Unrecognised compose file version \"{}\"; validating against the {} schema.",
            raw, version
        );
        validator.report(VERSION, Severity::Warning, &location, message);
    }

    log::debug!("Validating {} against schema {}", doc.name, version);
    validator.check(&doc.root, &ROOT, "");
    validator.findings
}

struct Validator<'a> {
    doc: &'a ConfigDocument,
    version: SchemaVersion,
    findings: Vec<Finding>,
}

impl Validator<'_> {
    fn report(&mut self, rule: &str, severity: Severity, location: &Location, message: String) {
        self.findings.push(
            Finding::new(
                rule,
                severity,
                RuleCategory::Schema,
                message,
                location.pos.line,
                location.pos.column,
            )
            .with_file(self.doc.source_name(location.file))
            .with_path(location.path.clone()),
        );
    }

    fn check(&mut self, node: &Node, spec: &Spec, path: &str) {
        let kind = Kind::of(node);
        let location = Location::new(node.file, node.pos, path);

        if !spec.accepts(kind) {
            let expected: Vec<&str> = spec.types.iter().map(|k| k.name()).collect();
            self.report(
                TYPE,
                Severity::Error,
                &location,
                format!(
                    "\"{}\" must be a {}, found {}.",
                    display_path(path),
                    expected.join(" or "),
                    kind.name()
                ),
            );
            return;
        }

        match &node.kind {
            NodeKind::Mapping(_) => self.check_mapping(node, spec, path),
            NodeKind::Sequence(items) => {
                if let Some(item_spec) = spec.items {
                    for (idx, item) in items.iter().enumerate() {
                        self.check(item, item_spec, &format!("{}[{}]", path, idx));
                    }
                }
            }
            NodeKind::Scalar(_) => {
                if spec.allowed.is_empty() {
                    return;
                }
                if let Some(value) = node.text() {
                    if !spec.allows(value) {
                        let allowed: Vec<String> = spec.allowed.iter().map(|v| format!("\"{}\"", v)).collect();
                        self.report(
                            ENUM,
                            Severity::Error,
                            &location,
                            format!(
                                "\"{}\" must be one of {}; found \"{}\".",
                                display_path(path),
                                allowed.join(", "),
                                value
                            ),
                        );
                    }
                }
            }
        }
    }

    fn check_mapping(&mut self, node: &Node, spec: &Spec, path: &str) {
        let entries = node.as_mapping().unwrap_or_default();

        for required in spec.required {
            if node.get(required.key).is_some() {
                continue;
            }
            let waived = required
                .unless
                .and_then(|other| node.get(other))
                .is_some_and(|v| v.as_bool() != Some(false));
            if !waived {
                self.report(
                    REQUIRED,
                    Severity::Error,
                    &Location::new(node.file, node.pos, path),
                    format!("\"{}\" is missing required key \"{}\".", display_path(path), required.key),
                );
            }
        }

        for entry in entries {
            if entry.key.starts_with("x-") {
                continue;
            }
            let child_path = if path.is_empty() {
                entry.key.clone()
            } else {
                format!("{}.{}", path, entry.key)
            };

            if let Some(entry_spec) = spec.entries {
                self.check(&entry.value, entry_spec, &child_path);
                continue;
            }
            if spec.fields.is_empty() {
                continue;
            }

            match spec.field(&entry.key) {
                Some(field) if field.since <= self.version => {
                    self.check(&entry.value, &field.spec, &child_path);
                }
                Some(_) => {
                    let location = Location::new(entry.value.file, entry.key_pos, child_path);
                    self.report(
                        UNKNOWN_KEY,
                        Severity::Warning,
                        &location,
                        format!(
                            "Key \"{}\" is not supported by compose file format {}.",
                            entry.key, self.version
                        ),
                    );
                }
                None => {
                    let location = Location::new(entry.value.file, entry.key_pos, child_path);
                    let message = if path.is_empty() {
                        format!("Unknown top-level key \"{}\".", entry.key)
                    } else {
                        format!("Unknown key \"{}\" in \"{}\".", entry.key, path)
                    };
                    self.report(UNKNOWN_KEY, Severity::Warning, &location, message);
                }
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "(root)" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_str;
    use std::path::Path;

    fn validate_yaml(yaml: &str) -> Vec<Finding> {
        let doc = load_str(yaml, "compose.yml", Path::new(".")).unwrap();
        validate(&doc, None)
    }

    fn rules(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[test]
    fn test_valid_document() {
        let yaml = r#"
name: shop
services:
  web:
    image: nginx:1.25
    restart: on-failure:3
    ports:
      - "8080:80"
      - target: 443
        published: 8443
        protocol: tcp
    healthcheck:
      test: ["CMD", "curl", "-f", "http://localhost"]
    deploy:
      resources:
        limits:
          cpus: "0.5"
          memory: 256M
networks:
  default:
volumes:
  data:
x-defaults:
  anything: goes
"#;
        assert!(validate_yaml(yaml).is_empty(), "{:?}", validate_yaml(yaml));
    }

    #[test]
    fn test_missing_services() {
        let findings = validate_yaml("name: shop\n");
        assert_eq!(rules(&findings), vec![REQUIRED]);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("services"));
    }

    #[test]
    fn test_type_mismatch() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    ports: "80:80"
    privileged: "yes"
"#;
        let findings = validate_yaml(yaml);
        assert_eq!(rules(&findings), vec![TYPE, TYPE]);
        assert_eq!(findings[0].path, "services.web.ports");
        assert_eq!(findings[0].line, 5);
        assert!(findings[0].message.contains("must be a sequence, found string"));
        assert_eq!(findings[1].path, "services.web.privileged");
    }

    #[test]
    fn test_union_type() {
        let yaml = "services:\n  web:\n    build: 42\n";
        let findings = validate_yaml(yaml);
        assert_eq!(rules(&findings), vec![TYPE]);
        assert!(findings[0].message.contains("string or mapping"));
    }

    #[test]
    fn test_enum_values() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    restart: sometimes
    pull_policy: eventually
    ports:
      - target: 80
        protocol: http
"#;
        let findings = validate_yaml(yaml);
        assert_eq!(rules(&findings), vec![ENUM, ENUM, ENUM]);
        assert_eq!(findings[2].path, "services.web.ports[0].protocol");
    }

    #[test]
    fn test_unknown_keys_are_warnings() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    imag: typo
    x-custom: ok
frobnicate: true
"#;
        let findings = validate_yaml(yaml);
        assert_eq!(rules(&findings), vec![UNKNOWN_KEY, UNKNOWN_KEY]);
        assert!(findings.iter().all(|f| f.severity == Severity::Warning));
        assert_eq!(findings[0].path, "services.web.imag");
        assert_eq!(findings[1].message, "Unknown top-level key \"frobnicate\".");
    }

    #[test]
    fn test_required_nested() {
        let yaml = r#"
services:
  web:
    image: nginx:1
    ports:
      - published: 80
    healthcheck:
      interval: 30s
  worker:
    image: worker:1
    healthcheck:
      disable: true
"#;
        let findings = validate_yaml(yaml);
        assert_eq!(rules(&findings), vec![REQUIRED, REQUIRED]);
        assert!(findings[0].message.contains("\"target\""));
        assert!(findings[1].message.contains("\"test\""));
    }

    #[test]
    fn test_version_specific_keys() {
        let yaml = r#"
version: "2.4"
name: shop
services:
  web:
    image: nginx:1
    deploy:
      replicas: 2
"#;
        let findings = validate_yaml(yaml);
        assert_eq!(rules(&findings), vec![UNKNOWN_KEY, UNKNOWN_KEY]);
        assert_eq!(findings[0].path, "name");
        assert_eq!(findings[1].path, "services.web.deploy");

        let doc = load_str(yaml, "compose.yml", Path::new(".")).unwrap();
        let findings = validate(&doc, Some(SchemaVersion::Spec));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_unrecognised_version() {
        let findings = validate_yaml("version: \"1\"\nservices: {}\n");
        assert_eq!(rules(&findings), vec![VERSION]);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_include_waives_services() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("base.yml"), "networks:\n  back:\n").unwrap();
        let doc = load_str("include:\n  - base.yml\n", "compose.yml", dir.path()).unwrap();
        assert!(validate(&doc, None).is_empty());
    }

    #[test]
    fn test_version_detection() {
        assert_eq!(SchemaVersion::parse("3.8"), Some(SchemaVersion::V3));
        assert_eq!(SchemaVersion::parse("2"), Some(SchemaVersion::V2));
        assert_eq!(SchemaVersion::parse("spec"), Some(SchemaVersion::Spec));
        assert_eq!(SchemaVersion::parse("1"), None);
        assert!(SchemaVersion::V2 < SchemaVersion::Spec);
    }

    #[test]
    fn test_deterministic() {
        let yaml = "services:\n  a:\n    restart: bad\n    foo: 1\n  b:\n    ports: 3\nbar: {}\n";
        assert_eq!(validate_yaml(yaml), validate_yaml(yaml));
    }
}
