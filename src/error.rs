//! Error types for loading documents and configuration.
//!
//! Only loader-stage failures are errors. Schema and rule violations are
//! reported as [`Finding`](crate::types::Finding)s and never surface here.

use thiserror::Error;

/// Malformed YAML in a compose document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// An include chain that re-enters a file already being loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cyclic include: {}", .chain.join(" -> "))]
pub struct CyclicIncludeError {
    /// Files on the include chain, ending with the re-entered file.
    pub chain: Vec<String>,
}

/// Fatal failure while loading one input file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    CyclicInclude(#[from] CyclicIncludeError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("include depth exceeds {limit} at {path}")]
    IncludeDepth { path: String, limit: usize },
}

impl LoadError {
    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::CyclicInclude(_) => "cyclic-include",
            Self::Io { .. } => "io",
            Self::IncludeDepth { .. } => "include-depth",
        }
    }

    /// Source position, when the error points into a document.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            Self::Parse(err) => Some((err.line, err.column)),
            _ => None,
        }
    }
}

/// Failure to load or interpret a linter configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new("compose.yml", 3, 7, "mapping values are not allowed");
        assert_eq!(
            err.to_string(),
            "compose.yml:3:7: mapping values are not allowed"
        );
    }

    #[test]
    fn test_cyclic_include_display() {
        let err = LoadError::from(CyclicIncludeError {
            chain: vec!["a.yml".into(), "b.yml".into(), "a.yml".into()],
        });
        assert_eq!(err.to_string(), "cyclic include: a.yml -> b.yml -> a.yml");
        assert_eq!(err.kind(), "cyclic-include");
        assert_eq!(err.position(), None);
    }
}
