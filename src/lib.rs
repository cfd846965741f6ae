//! # dclint
//!
//! A static linter for Docker Compose files. Each input is loaded (with
//! `include` resolution and multi-document merging), validated against the
//! compose file schema, and checked by a registry of rules. Findings are
//! rendered as text, stylish, JSON, SARIF or GitHub Actions annotations.
//!
//! # Attribution
//!
//! Several rules, their ids and the documentation they link to come from
//! [docker-compose-linter](https://github.com/zavoloklom/docker-compose-linter),
//! originally written in TypeScript by Sergey Kupletsky.
//!
//! **Original Project:** <https://github.com/zavoloklom/docker-compose-linter>
//! **Original License:** MIT
//!
//! ## Example
//!
//! ```rust,no_run
//! use dclint::{Driver, Input, LintConfig};
//!
//! let driver = Driver::new(LintConfig::default());
//! let outcome = driver.run(&[Input::file("docker-compose.yml")]);
//! for finding in outcome.report.findings() {
//!     println!("{}:{} {} {}", finding.file, finding.line, finding.rule_id, finding.message);
//! }
//! std::process::exit(outcome.code());
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod formatter;
pub mod lint;
pub mod loader;
pub mod parser;
pub mod pragma;
pub mod report;
pub mod rules;
pub mod schema;
pub mod types;

pub use config::{LintConfig, LintConfigBuilder, RuleConfig};
pub use driver::{CancellationToken, Driver, ExitOutcome, Input, RunOutcome, Stage};
pub use error::{ConfigError, CyclicIncludeError, LoadError, ParseError};
pub use formatter::{FormatOptions, OutputFormat, format_report};
pub use lint::{fix_content, lint_document, lint_str};
pub use loader::{ConfigDocument, load_file, load_reader, load_str};
pub use report::{FatalError, FileReport, Report, Summary};
pub use rules::{Rule, RuleRegistry};
pub use schema::SchemaVersion;
pub use types::{Finding, RuleCategory, RuleCode, Severity};
