//! Override merging of configuration trees.
//!
//! Used for multi-document streams and for `include` resolution, where the
//! including document overrides its bases key by key.

use crate::parser::{Entry, Node, NodeKind};

/// How two sequences at the same path combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceMerge {
    /// The overriding sequence replaces the base one.
    #[default]
    Replace,
    /// Base items first, then the overriding items.
    Append,
}

impl SequenceMerge {
    /// Read the `x-merge` directive from a document root.
    pub fn from_directive(root: &Node) -> Self {
        match root.get("x-merge").and_then(Node::as_str) {
            Some("append") => Self::Append,
            _ => Self::Replace,
        }
    }
}

/// Merge `overlay` on top of `base`.
///
/// - mapping + mapping: recursive, key by key, base order first
/// - sequence + sequence: replaced or appended per `sequences`
/// - anything else: the overlay wins
pub fn merge(base: Node, overlay: Node, sequences: SequenceMerge) -> Node {
    let Node { kind, pos, file } = overlay;
    match (base.kind, kind) {
        (NodeKind::Mapping(mut entries), NodeKind::Mapping(overrides)) => {
            for over in overrides {
                match entries.iter().position(|e| e.key == over.key) {
                    Some(idx) => {
                        let old = std::mem::replace(&mut entries[idx].value, Node::empty_mapping(file));
                        entries[idx] = Entry {
                            key: over.key,
                            key_pos: over.key_pos,
                            value: merge(old, over.value, sequences),
                        };
                    }
                    None => entries.push(over),
                }
            }
            Node::new(NodeKind::Mapping(entries), pos, file)
        }
        (NodeKind::Sequence(mut items), NodeKind::Sequence(more)) if sequences == SequenceMerge::Append => {
            items.extend(more);
            Node::new(NodeKind::Sequence(items), pos, file)
        }
        (_, kind) => Node::new(kind, pos, file),
    }
}
