//! Run driver: loads, validates and reports a batch of inputs.
//!
//! Each input moves through `Idle -> Loading -> Validating -> Reporting ->
//! Done`. A load failure moves it to `Failed` instead, which is final.
//! Inputs are processed on rayon's pool and collected in input order.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use crate::config::LintConfig;
use crate::loader::{self, ConfigDocument, STDIN_NAME};
use crate::error::LoadError;
use crate::lint::lint_document;
use crate::report::{FatalError, FileReport, Report};
use crate::rules::RuleRegistry;
use crate::types::RuleCode;

/// One thing to lint.
#[derive(Debug, Clone)]
pub enum Input {
    /// A file on disk; includes resolve against its directory.
    File(PathBuf),
    /// In-memory text such as standard input.
    Source { name: String, text: String, base_dir: PathBuf },
}

impl Input {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Text read from standard input; includes resolve against `base_dir`.
    pub fn stdin(text: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self::Source {
            name: STDIN_NAME.to_string(),
            text: text.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Display name used in reports.
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Source { name, .. } => name.clone(),
        }
    }

    fn load(&self) -> Result<ConfigDocument, LoadError> {
        match self {
            Self::File(path) => loader::load_file(path),
            Self::Source { name, text, base_dir } => loader::load_str(text, name, base_dir),
        }
    }
}

/// Processing stage of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Loading,
    Validating,
    Reporting,
    Done,
    Failed,
}

impl Stage {
    /// Whether `self -> next` is a legal transition.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Loading)
                | (Self::Loading, Self::Validating)
                | (Self::Loading, Self::Failed)
                | (Self::Validating, Self::Reporting)
                | (Self::Reporting, Self::Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal stage transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: Stage,
    pub to: Stage,
}

/// Stage bookkeeping for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTracker {
    stage: Stage,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self { stage: Stage::Idle }
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn advance(&mut self, next: Stage) -> Result<(), TransitionError> {
        if !self.stage.can_advance_to(next) {
            return Err(TransitionError { from: self.stage, to: next });
        }
        self.stage = next;
        Ok(())
    }
}

/// Cooperative cancellation flag shared with a running [`Driver`].
///
/// Checked before each input starts; inputs already in flight complete.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Process exit outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// No finding at or above the failure threshold.
    Success,
    /// At least one finding at or above the threshold.
    Violations,
    /// At least one input could not be loaded.
    Fatal,
}

impl ExitOutcome {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Violations => 1,
            Self::Fatal => 2,
        }
    }

    /// Fatal dominates violations.
    pub fn of(report: &Report, config: &LintConfig) -> Self {
        if report.has_fatal() {
            Self::Fatal
        } else if report.findings().any(|f| config.fails(f.severity)) {
            Self::Violations
        } else {
            Self::Success
        }
    }
}

/// Result of [`Driver::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub exit: ExitOutcome,
    /// Final stage of every input, in input order.
    pub stages: Vec<Stage>,
}

impl RunOutcome {
    pub fn code(&self) -> i32 {
        self.exit.code()
    }
}

/// Lints batches of inputs with one registry and configuration.
pub struct Driver {
    registry: RuleRegistry,
    config: LintConfig,
    cancel: CancellationToken,
}

impl Driver {
    /// Driver with the built-in rules.
    pub fn new(config: LintConfig) -> Self {
        Self::with_registry(RuleRegistry::with_builtins(), config)
    }

    pub fn with_registry(registry: RuleRegistry, config: LintConfig) -> Self {
        for id in config.rules.keys() {
            let code = RuleCode::new(id.as_str());
            if registry.get(id).is_none() && !code.is_schema_rule() {
                log::warn!("unknown rule \"{}\" in configuration", id);
            }
        }
        Self {
            registry,
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Token that stops inputs not yet started.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Lint every input. Findings of other inputs are kept when one fails.
    pub fn run(&self, inputs: &[Input]) -> RunOutcome {
        let results: Vec<(FileReport, Stage)> = inputs.par_iter().map(|input| self.process(input)).collect();
        let (files, stages): (Vec<FileReport>, Vec<Stage>) = results.into_iter().unzip();

        let report = Report::new(files);
        let exit = ExitOutcome::of(&report, &self.config);
        let summary = report.summary();
        log::info!(
            "linted {} file(s): {} error(s), {} warning(s), {} info, {} fatal, {} skipped",
            summary.files,
            summary.errors,
            summary.warnings,
            summary.infos,
            summary.fatal,
            summary.skipped
        );

        RunOutcome { report, exit, stages }
    }

    fn process(&self, input: &Input) -> (FileReport, Stage) {
        let name = input.name();
        if self.cancel.is_cancelled() {
            log::debug!("{}: cancelled before start", name);
            return (FileReport::cancelled(name), Stage::Idle);
        }

        let mut tracker = StageTracker::new();
        match self.drive(input, &name, &mut tracker) {
            Ok(report) => (report, tracker.stage()),
            Err(err) => {
                log::error!("{}: {}", name, err);
                (FileReport::failed(name, FatalError::new("internal", err.to_string())), tracker.stage())
            }
        }
    }

    fn drive(&self, input: &Input, name: &str, tracker: &mut StageTracker) -> Result<FileReport, TransitionError> {
        tracker.advance(Stage::Loading)?;
        log::debug!("{}: loading", name);
        let document = match input.load() {
            Ok(document) => document,
            Err(err) => {
                tracker.advance(Stage::Failed)?;
                log::debug!("{}: {} error: {}", name, err.kind(), err);
                return Ok(FileReport::failed(name, FatalError::from(&err)));
            }
        };

        tracker.advance(Stage::Validating)?;
        log::debug!("{}: validating", name);
        let findings = lint_document(&document, &self.registry, &self.config);

        tracker.advance(Stage::Reporting)?;
        let report = FileReport::new(name).with_findings(findings);
        tracker.advance(Stage::Done)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use std::fs;
    use tempfile::tempdir;

    fn source(name: &str, text: &str) -> Input {
        Input::Source {
            name: name.to_string(),
            text: text.to_string(),
            base_dir: PathBuf::from("."),
        }
    }

    fn quiet_config() -> LintConfig {
        LintConfig::default().disable("missing-resource-limits")
    }

    #[test]
    fn test_stage_transitions() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.stage(), Stage::Idle);
        assert!(tracker.advance(Stage::Validating).is_err());
        tracker.advance(Stage::Loading).unwrap();
        tracker.advance(Stage::Validating).unwrap();
        assert_eq!(
            tracker.advance(Stage::Failed),
            Err(TransitionError {
                from: Stage::Validating,
                to: Stage::Failed
            })
        );
        tracker.advance(Stage::Reporting).unwrap();
        tracker.advance(Stage::Done).unwrap();
        assert!(tracker.stage().is_terminal());
        assert!(tracker.advance(Stage::Loading).is_err());

        assert!(!Stage::Failed.can_advance_to(Stage::Validating));
        assert!(!Stage::Idle.can_advance_to(Stage::Failed));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitOutcome::Success.code(), 0);
        assert_eq!(ExitOutcome::Violations.code(), 1);
        assert_eq!(ExitOutcome::Fatal.code(), 2);
    }

    #[test]
    fn test_threshold() {
        let input = [source("compose.yml", "services:\n  web:\n    image: nginx\n")];

        let outcome = Driver::new(quiet_config()).run(&input);
        assert_eq!(outcome.report.findings().count(), 1);
        assert_eq!(outcome.code(), 0);

        let outcome = Driver::new(quiet_config().with_threshold(Severity::Warning)).run(&input);
        assert_eq!(outcome.code(), 1);
        assert_eq!(outcome.stages, vec![Stage::Done]);
    }

    #[test]
    fn test_fatal_dominates() {
        let inputs = [
            source("bad.yml", "services:\n  web: [unclosed\n"),
            source("good.yml", "services:\n  web:\n    build: .\n    image: app:1\n"),
        ];
        let outcome = Driver::new(quiet_config()).run(&inputs);

        assert_eq!(outcome.exit, ExitOutcome::Fatal);
        assert_eq!(outcome.stages, vec![Stage::Failed, Stage::Done]);
        assert_eq!(outcome.report.files[0].file_path, "bad.yml");
        assert_eq!(outcome.report.files[0].fatal.as_ref().unwrap().kind, "parse");
        assert!(outcome.report.files[0].findings.is_empty());
        assert_eq!(outcome.report.files[1].file_path, "good.yml");
        assert_eq!(outcome.report.files[1].findings[0].rule_id.as_str(), "no-build-and-image");
    }

    #[test]
    fn test_include_cycle_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yml"), "include:\n  - b.yml\nservices: {}\n").unwrap();
        fs::write(dir.path().join("b.yml"), "include:\n  - a.yml\nservices: {}\n").unwrap();

        let outcome = Driver::new(LintConfig::default()).run(&[Input::file(dir.path().join("a.yml"))]);
        assert_eq!(outcome.code(), 2);
        let file = &outcome.report.files[0];
        let fatal = file.fatal.as_ref().unwrap();
        assert_eq!(fatal.kind, "cyclic-include");
        assert!(fatal.message.contains("a.yml") && fatal.message.contains("b.yml"));
        assert!(file.findings.is_empty());
    }

    #[test]
    fn test_input_order_preserved() {
        let inputs: Vec<Input> = (0..16)
            .map(|i| source(&format!("f{i}.yml"), "services:\n  web:\n    image: nginx:1\n"))
            .collect();
        let outcome = Driver::new(quiet_config()).run(&inputs);
        let names: Vec<_> = outcome.report.files.iter().map(|f| f.file_path.clone()).collect();
        let expected: Vec<_> = (0..16).map(|i| format!("f{i}.yml")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_cancelled_before_start() {
        let driver = Driver::new(quiet_config());
        driver.cancellation_token().cancel();
        let outcome = driver.run(&[source("compose.yml", "services:\n  web:\n    image: nginx\n")]);

        assert!(outcome.report.files[0].cancelled);
        assert_eq!(outcome.stages, vec![Stage::Idle]);
        assert_eq!(outcome.report.summary().skipped, 1);
        assert_eq!(outcome.code(), 0);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let outcome = Driver::new(LintConfig::default()).run(&[Input::file("/nonexistent/compose.yml")]);
        assert_eq!(outcome.code(), 2);
        assert_eq!(outcome.report.files[0].fatal.as_ref().unwrap().kind, "io");
    }
}
