//! YAML parser for Docker Compose files.
//!
//! Builds a position-tracked [`Node`] tree from yaml-rust2's marked event
//! stream. Every node remembers the line/column it started at and the
//! index of the source file it came from, so findings on merged documents
//! still point at the right file.

pub mod compose;
pub mod merge;

pub use compose::{ComposeFile, Dependency, Located, PortRange, Service, ServicePort};
pub use merge::{SequenceMerge, merge};

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::ParseError;

/// Upper bound on nodes materialised by alias expansion in one stream.
pub const MAX_ALIAS_NODES: usize = 100_000;

/// Position in the source file (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    fn from_marker(mark: &Marker) -> Self {
        Self {
            line: mark.line() as u32,
            column: mark.col() as u32 + 1,
        }
    }
}

/// Where a value lives: source file index, position and dotted tree path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: usize,
    pub pos: Position,
    pub path: String,
}

impl Location {
    pub fn new(file: usize, pos: Position, path: impl Into<String>) -> Self {
        Self {
            file,
            pos,
            path: path.into(),
        }
    }
}

/// A resolved scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A scalar node: resolved value, the raw source text and its quoting.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: ScalarValue,
    pub raw: String,
    pub quoted: bool,
}

/// One `key: value` pair of a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub key_pos: Position,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(Scalar),
    Mapping(Vec<Entry>),
    Sequence(Vec<Node>),
}

/// A node of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Position,
    /// Index into the owning document's source list.
    pub file: usize,
}

impl Node {
    pub fn new(kind: NodeKind, pos: Position, file: usize) -> Self {
        Self { kind, pos, file }
    }

    /// An empty mapping, used as the neutral element for merges.
    pub fn empty_mapping(file: usize) -> Self {
        Self::new(NodeKind::Mapping(Vec::new()), Position::new(1, 1), file)
    }

    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a mapping entry by key.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.as_mapping()?.iter().find(|e| e.key == key)
    }

    /// Look up a mapping value by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }

    /// String value of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(Scalar {
                value: ScalarValue::String(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            NodeKind::Scalar(Scalar {
                value: ScalarValue::Bool(b),
                ..
            }) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.kind {
            NodeKind::Scalar(Scalar {
                value: ScalarValue::Int(i),
                ..
            }) => Some(*i),
            _ => None,
        }
    }

    /// Source text of any non-null scalar (numbers keep their spelling).
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(Scalar {
                value: ScalarValue::Null,
                ..
            }) => None,
            NodeKind::Scalar(s) => Some(match &s.value {
                ScalarValue::String(v) => v.as_str(),
                _ => s.raw.as_str(),
            }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            &self.kind,
            NodeKind::Scalar(Scalar {
                value: ScalarValue::Null,
                ..
            })
        )
    }

    /// Human name of the value's type, as used in schema messages.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Scalar(s) => match s.value {
                ScalarValue::Null => "null",
                ScalarValue::Bool(_) => "boolean",
                ScalarValue::Int(_) | ScalarValue::Float(_) => "number",
                ScalarValue::String(_) => "string",
            },
        }
    }
}

/// Resolve a plain scalar per the YAML 1.2 core schema.
fn resolve_plain(raw: &str) -> ScalarValue {
    match raw {
        "" | "~" | "null" | "Null" | "NULL" => return ScalarValue::Null,
        "true" | "True" | "TRUE" => return ScalarValue::Bool(true),
        "false" | "False" | "FALSE" => return ScalarValue::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" => return ScalarValue::Float(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return ScalarValue::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return ScalarValue::Float(f64::NAN),
        _ => {}
    }

    if let Some(hex) = raw.strip_prefix("0x") {
        if let Ok(i) = i64::from_str_radix(hex, 16) {
            return ScalarValue::Int(i);
        }
    }
    if let Some(oct) = raw.strip_prefix("0o") {
        if let Ok(i) = i64::from_str_radix(oct, 8) {
            return ScalarValue::Int(i);
        }
    }
    if let Ok(i) = raw.parse::<i64>() {
        return ScalarValue::Int(i);
    }
    let looks_numeric = raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && raw.chars().any(|c| c.is_ascii_digit());
    if looks_numeric {
        if let Ok(f) = raw.parse::<f64>() {
            return ScalarValue::Float(f);
        }
    }

    ScalarValue::String(raw.to_string())
}

enum Frame {
    Sequence {
        pos: Position,
        anchor: usize,
        items: Vec<Node>,
    },
    Mapping {
        pos: Position,
        anchor: usize,
        entries: Vec<Entry>,
        pending_key: Option<(String, Position)>,
        merge_sources: Vec<Node>,
    },
}

/// Event receiver assembling nodes; one root per YAML document.
struct TreeBuilder {
    file: usize,
    stack: Vec<Frame>,
    anchors: HashMap<usize, (Node, usize)>,
    documents: Vec<Node>,
    expanded: usize,
    overflow: Option<Position>,
}

/// Number of nodes in a subtree.
fn node_count(node: &Node) -> usize {
    1 + match &node.kind {
        NodeKind::Scalar(_) => 0,
        NodeKind::Sequence(items) => items.iter().map(node_count).sum(),
        NodeKind::Mapping(entries) => entries.iter().map(|e| node_count(&e.value)).sum(),
    }
}

impl TreeBuilder {
    fn new(file: usize) -> Self {
        Self {
            file,
            stack: Vec::new(),
            anchors: HashMap::new(),
            documents: Vec::new(),
            expanded: 0,
            overflow: None,
        }
    }

    fn finish(&mut self, node: Node, anchor: usize) {
        if anchor != 0 {
            let size = node_count(&node);
            self.anchors.insert(anchor, (node.clone(), size));
        }
        self.push_value(node);
    }

    fn push_value(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.documents.push(node),
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                merge_sources,
                ..
            }) => match pending_key.take() {
                None => {
                    let key = node
                        .text()
                        .map(str::to_string)
                        .unwrap_or_else(|| if node.is_null() { "null" } else { "<complex>" }.to_string());
                    *pending_key = Some((key, node.pos));
                }
                Some((key, _)) if key == "<<" => match node.kind {
                    NodeKind::Sequence(items) => merge_sources.extend(items),
                    _ => merge_sources.push(node),
                },
                Some((key, key_pos)) => {
                    if let Some(existing) = entries.iter_mut().find(|e| e.key == key) {
                        existing.key_pos = key_pos;
                        existing.value = node;
                    } else {
                        entries.push(Entry {
                            key,
                            key_pos,
                            value: node,
                        });
                    }
                }
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        let pos = Position::from_marker(&mark);
        match ev {
            Event::Scalar(raw, style, anchor, _) => {
                let quoted = style != TScalarStyle::Plain;
                let value = if quoted {
                    ScalarValue::String(raw.clone())
                } else {
                    resolve_plain(&raw)
                };
                let node = Node::new(NodeKind::Scalar(Scalar { value, raw, quoted }), pos, self.file);
                self.finish(node, anchor);
            }
            Event::Alias(id) => {
                let null = Node::new(
                    NodeKind::Scalar(Scalar {
                        value: ScalarValue::Null,
                        raw: String::new(),
                        quoted: false,
                    }),
                    pos,
                    self.file,
                );
                let node = match self.anchors.get(&id) {
                    Some(_) if self.overflow.is_some() => null,
                    Some((anchored, size)) => {
                        self.expanded += size;
                        if self.expanded > MAX_ALIAS_NODES {
                            self.overflow = Some(pos);
                            null
                        } else {
                            anchored.clone()
                        }
                    }
                    None => null,
                };
                self.push_value(node);
            }
            Event::SequenceStart(anchor, _) => self.stack.push(Frame::Sequence {
                pos,
                anchor,
                items: Vec::new(),
            }),
            Event::MappingStart(anchor, _) => self.stack.push(Frame::Mapping {
                pos,
                anchor,
                entries: Vec::new(),
                pending_key: None,
                merge_sources: Vec::new(),
            }),
            Event::SequenceEnd => {
                if let Some(Frame::Sequence { pos, anchor, items }) = self.stack.pop() {
                    let node = Node::new(NodeKind::Sequence(items), pos, self.file);
                    self.finish(node, anchor);
                }
            }
            Event::MappingEnd => {
                if let Some(Frame::Mapping {
                    pos,
                    anchor,
                    mut entries,
                    merge_sources,
                    ..
                }) = self.stack.pop()
                {
                    // `<<` merge keys never override explicit keys.
                    for source in merge_sources {
                        if let NodeKind::Mapping(inherited) = source.kind {
                            for entry in inherited {
                                if !entries.iter().any(|e| e.key == entry.key) {
                                    entries.push(entry);
                                }
                            }
                        }
                    }
                    let node = Node::new(NodeKind::Mapping(entries), pos, self.file);
                    self.finish(node, anchor);
                }
            }
            _ => {}
        }
    }
}

/// Parse every YAML document in `content` into its own root node.
pub fn parse_documents(content: &str, file_name: &str, file: usize) -> Result<Vec<Node>, ParseError> {
    let mut builder = TreeBuilder::new(file);
    let mut parser = Parser::new_from_str(content);
    parser.load(&mut builder, true).map_err(|e| {
        let mark = e.marker();
        ParseError::new(
            file_name,
            mark.line() as u32,
            mark.col() as u32 + 1,
            e.info().to_string(),
        )
    })?;
    if let Some(pos) = builder.overflow {
        return Err(ParseError::new(
            file_name,
            pos.line,
            pos.column,
            format!("alias expansion limit exceeded ({MAX_ALIAS_NODES} nodes)"),
        ));
    }
    Ok(builder.documents)
}

/// Parse a compose document. Multiple YAML documents in one stream are
/// merged in order, later documents overriding earlier ones.
pub fn parse_document(content: &str, file_name: &str, file: usize) -> Result<Node, ParseError> {
    let documents = parse_documents(content, file_name, file)?;
    let mut merged: Option<Node> = None;

    for doc in documents {
        if doc.is_null() {
            continue;
        }
        if doc.as_mapping().is_none() {
            return Err(ParseError::new(
                file_name,
                doc.pos.line,
                doc.pos.column,
                format!("root must be a mapping, found {}", doc.type_name()),
            ));
        }
        merged = Some(match merged {
            None => doc,
            Some(base) => merge(base, doc, SequenceMerge::Replace),
        });
    }

    merged.ok_or_else(|| ParseError::new(file_name, 1, 1, "empty document"))
}
