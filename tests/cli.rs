//! Integration tests for the dclint binary: exit codes and output formats.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly.
#![allow(deprecated)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/compose")
        .join(name)
}

/// A command running in an empty directory, so no config file is discovered.
fn dclint(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("dclint"));
    cmd.current_dir(temp.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_clean_file_exits_zero() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("clean.yml"))
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn cli_unpinned_image_respects_threshold() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("unpinned.yml"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("3:5 [warning] no-version-pin:"));

    dclint(&temp)
        .arg(fixture("unpinned.yml"))
        .args(["--threshold", "warning"])
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn cli_fatal_and_findings_together() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("malformed.yml"))
        .arg(fixture("noncompliant.yml"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("malformed.yml:").and(predicate::str::contains("[fatal] load:")))
        .stdout(predicate::str::contains("noncompliant.yml:5:5 [error] no-build-and-image:"))
        .stdout(predicate::str::contains("[error] duplicate-port-mapping:"));
    Ok(())
}

#[test]
fn cli_include_cycle() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("cycle/a.yml"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("cyclic include").and(predicate::str::contains("b.yml")));
    Ok(())
}

#[test]
fn cli_json_output_parses_back() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = dclint(&temp)
        .arg(fixture("noncompliant.yml"))
        .args(["--format", "json"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));

    let report = dclint::formatter::json::parse(&String::from_utf8(output.stdout)?)?;
    assert_eq!(report.files.len(), 1);
    assert!(report.findings().any(|f| f.rule_id.as_str() == "no-build-and-image"));
    Ok(())
}

#[test]
fn cli_sarif_and_github_formats() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("noncompliant.yml"))
        .args(["--format", "sarif"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"version\": \"2.1.0\""));

    dclint(&temp)
        .arg(fixture("noncompliant.yml"))
        .args(["--format", "github"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("::error file="));
    Ok(())
}

#[test]
fn cli_reads_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg("-")
        .write_stdin("services:\n  web:\n    image: nginx\n")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("<stdin>:3:5 [warning] no-version-pin:"));
    Ok(())
}

#[test]
fn cli_disable_rule() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("unpinned.yml"))
        .args(["--threshold", "warning", "--disable", "no-version-pin"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("no-version-pin").not());
    Ok(())
}

#[test]
fn cli_discovers_directory_and_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("compose.yml"), "services:\n  web:\n    image: nginx\n")?;
    fs::write(temp.path().join(".dclintrc.yml"), "threshold: warning\n")?;

    dclint(&temp)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("compose.yml:3:5"));
    Ok(())
}

#[test]
fn cli_invalid_config_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("bad.json"), "{ not json")?;
    dclint(&temp)
        .arg(fixture("clean.yml"))
        .args(["--config", "bad.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load configuration"));
    Ok(())
}

#[test]
fn cli_usage_error_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp).args(["--format", "xml"]).assert().code(2);
    Ok(())
}

#[test]
fn cli_fix_rewrites_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.path().join("docker-compose.yml");
    fs::write(&path, "version: \"3\"\nservices:\n  web:\n    image: nginx:1\n")?;

    dclint(&temp).args(["--fix-dry-run", "docker-compose.yml"]).assert().code(0);
    assert!(fs::read_to_string(&path)?.starts_with("version"));

    dclint(&temp)
        .args(["--fix", "docker-compose.yml"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("deprecated-syntax").not());
    assert_eq!(fs::read_to_string(&path)?, "services:\n  web:\n    image: nginx:1\n");
    Ok(())
}

#[test]
fn cli_fix_preview_keeps_json_report_parseable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let path = temp.path().join("docker-compose.yml");
    fs::write(&path, "version: \"3\"\nservices:\n  web:\n    image: nginx:1\n")?;

    let output = dclint(&temp)
        .args(["--fix-dry-run", "--format", "json", "docker-compose.yml"])
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stderr)?.contains("docker-compose.yml (fixed)"));

    let report = dclint::formatter::json::parse(&String::from_utf8(output.stdout)?)?;
    assert!(report.findings().any(|f| f.rule_id.as_str() == "deprecated-syntax"));

    let output = dclint(&temp)
        .args(["--fix", "--format", "json", "-"])
        .write_stdin("version: \"3\"\nservices:\n  web:\n    image: nginx:1\n")
        .output()?;
    assert!(String::from_utf8(output.stderr)?.contains("services:"));
    dclint::formatter::json::parse(&String::from_utf8(output.stdout)?)?;
    Ok(())
}

#[test]
fn cli_writes_output_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    dclint(&temp)
        .arg(fixture("unpinned.yml"))
        .args(["-o", "report.txt"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
    assert!(fs::read_to_string(temp.path().join("report.txt"))?.contains("no-version-pin"));
    Ok(())
}
