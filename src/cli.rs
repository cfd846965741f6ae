use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::LintConfig;
use crate::error::ConfigError;
use crate::formatter::OutputFormat;
use crate::schema::SchemaVersion;
use crate::types::Severity;

#[derive(Parser, Debug)]
#[command(name = "dclint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lint Docker Compose files")]
#[command(
    long_about = "Validates Docker Compose files against the compose file schema and a set of best-practice, security and style rules. Exits 0 when clean, 1 on findings at or above the threshold, 2 when a file cannot be loaded."
)]
pub struct Cli {
    /// Files or directories to lint; `-` reads standard input
    #[arg(value_name = "PATHS", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Path to a linter configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Compose file format to validate against
    #[arg(long, value_enum)]
    pub schema_version: Option<SchemaVersionArg>,

    /// Lowest severity that fails the run
    #[arg(short, long, value_enum)]
    pub threshold: Option<SeverityArg>,

    /// Disable a rule (repeatable)
    #[arg(long = "disable", value_name = "RULE")]
    pub disable: Vec<String>,

    /// Scan directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Exclude paths matching a pattern (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Apply automatic fixes to the files
    #[arg(long)]
    pub fix: bool,

    /// Print fixed content instead of writing it
    #[arg(long, conflicts_with = "fix")]
    pub fix_dry_run: bool,

    /// Report fixable problems only
    #[arg(long)]
    pub fixable_only: bool,

    /// Ignore `# dclint-disable` comments
    #[arg(long)]
    pub disable_ignore_pragma: bool,

    /// Colour stylish output
    #[arg(long)]
    pub color: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Stylish,
    Json,
    Sarif,
    Github,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Stylish => OutputFormat::Stylish,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
            FormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Error,
    Warning,
    Info,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Error => Severity::Error,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Info => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaVersionArg {
    #[value(name = "2")]
    V2,
    #[value(name = "3")]
    V3,
    #[value(name = "spec", alias = "latest")]
    Spec,
}

impl From<SchemaVersionArg> for SchemaVersion {
    fn from(arg: SchemaVersionArg) -> Self {
        match arg {
            SchemaVersionArg::V2 => SchemaVersion::V2,
            SchemaVersionArg::V3 => SchemaVersion::V3,
            SchemaVersionArg::Spec => SchemaVersion::Spec,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }

    /// Whether `-` was given, meaning standard input.
    pub fn reads_stdin(&self) -> bool {
        self.paths.iter().any(|p| p.as_os_str() == "-")
    }

    /// Paths other than `-`.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.paths.iter().filter(|p| p.as_os_str() != "-").cloned().collect()
    }

    /// Load the configuration file (explicit, or discovered in `cwd`) and
    /// layer the command-line overrides on top.
    pub fn lint_config(&self, cwd: &Path) -> Result<LintConfig, ConfigError> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => LintConfig::discover(cwd),
        };
        let mut config = match path {
            Some(path) => {
                log::info!("using configuration {}", path.display());
                LintConfig::from_file(&path)?
            }
            None => LintConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold.into());
        }
        if let Some(version) = self.schema_version {
            config = config.with_schema_version(version.into());
        }
        for rule in &self.disable {
            config = config.disable(rule.as_str());
        }
        for pattern in &self.exclude {
            config = config.with_exclude(pattern.as_str());
        }
        if self.fixable_only {
            config = config.with_fixable_only(true);
        }
        if self.disable_ignore_pragma {
            config = config.with_disable_ignore_pragma(true);
        }

        Ok(config)
    }
}
