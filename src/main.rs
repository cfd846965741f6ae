use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use dclint::cli::Cli;
use dclint::config::LintConfig;
use dclint::discovery::discover;
use dclint::driver::{Driver, ExitOutcome, Input};
use dclint::formatter::{FormatOptions, OutputFormat, format_report};
use dclint::lint::fix_content;
use dclint::rules::RuleRegistry;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(ExitOutcome::Fatal.code());
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let config = cli.lint_config(&cwd).context("failed to load configuration")?;

    let files = discover(&cli.file_paths(), cli.recursive, &config);
    let stdin_text = if cli.reads_stdin() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        Some(text)
    } else {
        None
    };

    if files.is_empty() && stdin_text.is_none() {
        log::warn!("no compose files to lint");
    }

    let registry = RuleRegistry::with_builtins();
    if cli.fix || cli.fix_dry_run {
        apply_fixes(cli, &files, stdin_text.as_deref(), &registry, &config)?;
    }

    let mut inputs: Vec<Input> = files.into_iter().map(Input::File).collect();
    if let Some(text) = stdin_text {
        inputs.push(Input::stdin(text, &cwd));
    }

    let driver = Driver::with_registry(registry, config);
    let outcome = driver.run(&inputs);

    let format = OutputFormat::from(cli.format);
    if format == OutputFormat::Stylish {
        colored::control::set_override(cli.color);
    }
    let rendered = format_report(&outcome.report, format, &FormatOptions { color: cli.color });
    write_output(cli.output.as_deref(), &rendered)?;

    Ok(outcome.code())
}

/// Rewrite files in place, or print the fixed text for a dry run.
fn apply_fixes(
    cli: &Cli,
    files: &[std::path::PathBuf],
    stdin_text: Option<&str>,
    registry: &RuleRegistry,
    config: &LintConfig,
) -> Result<()> {
    for path in files {
        let Ok(content) = fs::read_to_string(path) else {
            // Unreadable files are reported by the lint run.
            continue;
        };
        let fixed = fix_content(&content, registry, config);
        if fixed == content {
            continue;
        }
        // Previews go to stderr so the report on stdout stays parseable.
        if cli.fix_dry_run {
            eprintln!("--- {} (fixed)\n{}", path.display(), fixed);
        } else {
            fs::write(path, &fixed).with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("fixed {}", path.display());
        }
    }

    // Standard input cannot be rewritten in place.
    if let Some(text) = stdin_text {
        let fixed = fix_content(text, registry, config);
        if fixed != text {
            eprint!("{}", fixed);
        }
    }

    Ok(())
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
