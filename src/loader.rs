//! Document loader: reads compose files, resolves `include` chains and
//! produces one merged [`ConfigDocument`] per input.
//!
//! Included documents form the base and the including document overrides
//! them key by key. Sequences are replaced unless the including document
//! declares `x-merge: append`. Cycles are detected with a depth-first walk
//! over canonicalised paths.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{CyclicIncludeError, LoadError};
use crate::parser::{Node, NodeKind, SequenceMerge, merge, parse_document};

/// Maximum include nesting.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Display name used for documents read from standard input.
pub const STDIN_NAME: &str = "<stdin>";

/// The merged representation of one input file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    /// Display name of the input (path as given, or `<stdin>`).
    pub name: String,
    /// Merged root mapping.
    pub root: Node,
    /// Files that contributed nodes; index 0 is the input itself.
    pub sources: Vec<String>,
    /// Raw text of the input file.
    pub text: String,
}

impl ConfigDocument {
    /// Display name of the file a node came from.
    pub fn source_name(&self, file: usize) -> &str {
        self.sources.get(file).map(String::as_str).unwrap_or(&self.name)
    }
}

/// Load a compose file from disk.
pub fn load_file(path: &Path) -> Result<ConfigDocument, LoadError> {
    let name = path.display().to_string();
    let text = read_file(path)?;
    let canonical = canonicalize(path)?;
    let base_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut session = LoadSession::default();
    session.active.push((canonical, name.clone()));
    let root = session.load_text(&text, &name, &base_dir)?;

    Ok(ConfigDocument {
        name,
        root,
        sources: session.sources,
        text,
    })
}

/// Load a document from in-memory text. Includes resolve against `base_dir`.
pub fn load_str(text: &str, name: &str, base_dir: &Path) -> Result<ConfigDocument, LoadError> {
    let mut session = LoadSession::default();
    let root = session.load_text(text, name, base_dir)?;

    Ok(ConfigDocument {
        name: name.to_string(),
        root,
        sources: session.sources,
        text: text.to_string(),
    })
}

/// Load a single document from a stream such as standard input.
pub fn load_reader<R: Read>(mut reader: R, name: &str, base_dir: &Path) -> Result<ConfigDocument, LoadError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| LoadError::Io {
            path: name.to_string(),
            source,
        })?;
    load_str(&text, name, base_dir)
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn canonicalize(path: &Path) -> Result<PathBuf, LoadError> {
    fs::canonicalize(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Default)]
struct LoadSession {
    sources: Vec<String>,
    /// Files on the current include chain: (canonical path, display name).
    active: Vec<(PathBuf, String)>,
}

impl LoadSession {
    fn load_text(&mut self, text: &str, name: &str, base_dir: &Path) -> Result<Node, LoadError> {
        let file = self.sources.len();
        self.sources.push(name.to_string());

        let root = parse_document(text, name, file)?;
        let includes = include_paths(&root);
        if includes.is_empty() {
            return Ok(root);
        }

        let mode = SequenceMerge::from_directive(&root);
        let mut base: Option<Node> = None;

        for include in includes {
            let path = base_dir.join(&include);
            let included = self.load_include(&path)?;
            base = Some(match base {
                None => included,
                Some(prev) => merge(prev, included, mode),
            });
        }

        Ok(match base {
            Some(base) => merge(base, root, mode),
            None => root,
        })
    }

    fn load_include(&mut self, path: &Path) -> Result<Node, LoadError> {
        let name = path.display().to_string();
        let canonical = canonicalize(path)?;

        if let Some(start) = self.active.iter().position(|(p, _)| *p == canonical) {
            let mut chain: Vec<String> = self.active[start..].iter().map(|(_, n)| n.clone()).collect();
            chain.push(name);
            return Err(CyclicIncludeError { chain }.into());
        }
        if self.active.len() >= MAX_INCLUDE_DEPTH {
            return Err(LoadError::IncludeDepth {
                path: name,
                limit: MAX_INCLUDE_DEPTH,
            });
        }

        log::debug!("Resolving include {}", name);
        let text = read_file(path)?;
        let base_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

        self.active.push((canonical, name.clone()));
        let result = self.load_text(&text, &name, &base_dir);
        self.active.pop();
        result
    }
}

/// Collect include paths from a root's `include` key.
///
/// Accepts a string, a sequence of strings, or a sequence of mappings
/// with a `path` key (itself a string or a sequence of strings).
fn include_paths(root: &Node) -> Vec<String> {
    let Some(include) = root.get("include") else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    let mut push_path = |node: &Node| match &node.kind {
        NodeKind::Scalar(_) => paths.extend(node.as_str().map(str::to_string)),
        NodeKind::Sequence(items) => paths.extend(items.iter().filter_map(|i| i.as_str().map(str::to_string))),
        NodeKind::Mapping(_) => {}
    };

    match &include.kind {
        NodeKind::Sequence(items) => {
            for item in items {
                match item.get("path") {
                    Some(path) => push_path(path),
                    None => push_path(item),
                }
            }
        }
        _ => push_path(include),
    }

    paths
}
