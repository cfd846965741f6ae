//! Expand path arguments into the compose files to lint.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::LintConfig;

/// `docker-compose.yml`, `compose.yaml`, `prod.compose.yml`,
/// `docker-compose.override.yaml`, ...
static COMPOSE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:docker-)?compose|[^/]+\.compose|docker-compose\.[^/]+)\.ya?ml$").unwrap()
});

/// Whether a file name looks like a compose file.
pub fn is_compose_file_name(name: &str) -> bool {
    COMPOSE_FILE.is_match(name)
}

/// Expand `paths` into a sorted, de-duplicated list of files.
///
/// Files are kept as given, even when their name does not look like a
/// compose file or does not exist; the loader reports those. Directories
/// are scanned for compose file names, one level deep unless `recursive`.
/// Exclude patterns apply to scanned files only.
pub fn discover(paths: &[PathBuf], recursive: bool, config: &LintConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            scan_dir(path, recursive, config, &mut files);
        } else {
            files.push(path.clone());
        }
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
    files
}

fn scan_dir(dir: &Path, recursive: bool, config: &LintConfig, files: &mut Vec<PathBuf>) {
    let mut walker = walkdir::WalkDir::new(dir).follow_links(true).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut found = 0usize;
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let entry_path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_compose_file_name(name) {
            continue;
        }
        if config.is_excluded(&entry_path.display().to_string()) {
            log::debug!("excluded {}", entry_path.display());
            continue;
        }
        files.push(entry_path.to_path_buf());
        found += 1;
    }

    if found == 0 {
        log::warn!("no compose files found in {}", dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_compose_file_names() {
        for name in [
            "docker-compose.yml",
            "docker-compose.yaml",
            "compose.yml",
            "compose.yaml",
            "prod.compose.yml",
            "docker-compose.override.yml",
        ] {
            assert!(is_compose_file_name(name), "{name}");
        }
        for name in ["config.yml", "compose.json", "docker-compose.yml.bak", "mycompose.yml"] {
            assert!(!is_compose_file_name(name), "{name}");
        }
    }

    #[test]
    fn test_discover_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("compose.yml"), "services: {}\n").unwrap();
        fs::write(dir.path().join("notes.yml"), "a: 1\n").unwrap();
        fs::write(nested.join("docker-compose.yml"), "services: {}\n").unwrap();

        let config = LintConfig::default();
        let flat = discover(&[dir.path().to_path_buf()], false, &config);
        assert_eq!(flat, vec![dir.path().join("compose.yml")]);

        let deep = discover(&[dir.path().to_path_buf()], true, &config);
        assert_eq!(deep.len(), 2);
        assert!(deep.contains(&nested.join("docker-compose.yml")));

        let excluded = discover(&[dir.path().to_path_buf()], true, &config.with_exclude("nested"));
        assert_eq!(excluded, vec![dir.path().join("compose.yml")]);
    }

    #[test]
    fn test_explicit_files_kept() {
        let paths = vec![PathBuf::from("missing.yml"), PathBuf::from("missing.yml")];
        assert_eq!(discover(&paths, false, &LintConfig::default()), vec![PathBuf::from("missing.yml")]);
    }
}
