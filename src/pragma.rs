//! Comment pragmas for suppressing findings.
//!
//! - `# dclint-disable-file [rules]` - the whole file
//! - `# dclint-disable [rules]` - from this line to the end of the file
//! - `# dclint-disable-next-line [rules]` - the following line only
//! - `... # dclint-disable-line [rules]` - trailing comment, this line only
//!
//! Rule lists are separated by commas or whitespace; no list means all rules.

use std::collections::{HashMap, HashSet};

use crate::types::RuleCode;

/// A set of suppressed rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Rules(HashSet<String>),
}

impl Scope {
    fn from_list(rules: Vec<String>) -> Self {
        if rules.is_empty() || rules.iter().any(|r| r == "*") {
            Self::All
        } else {
            Self::Rules(rules.into_iter().collect())
        }
    }

    fn covers(&self, code: &RuleCode) -> bool {
        match self {
            Self::All => true,
            Self::Rules(rules) => rules.contains(code.as_str()),
        }
    }

    fn extend(&mut self, other: Scope) {
        match (self, other) {
            (Self::All, _) => {}
            (this, Self::All) => *this = Self::All,
            (Self::Rules(rules), Self::Rules(more)) => rules.extend(more),
        }
    }
}

/// Suppressions extracted from one file.
#[derive(Debug, Clone, Default)]
pub struct Pragmas {
    file: Option<Scope>,
    /// `dclint-disable` blocks: (first line, scope).
    from_line: Vec<(u32, Scope)>,
    lines: HashMap<u32, Scope>,
}

impl Pragmas {
    /// Whether the file carries no pragmas at all.
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.from_line.is_empty() && self.lines.is_empty()
    }

    /// Whether a finding of `code` at `line` is suppressed.
    pub fn suppresses(&self, code: &RuleCode, line: u32) -> bool {
        if self.file.as_ref().is_some_and(|s| s.covers(code)) {
            return true;
        }
        if self
            .from_line
            .iter()
            .any(|(start, scope)| line >= *start && scope.covers(code))
        {
            return true;
        }
        self.lines.get(&line).is_some_and(|s| s.covers(code))
    }

    /// Whether every rule is disabled for the whole file.
    pub fn disables_file(&self) -> bool {
        matches!(self.file, Some(Scope::All))
    }

    fn disable_line(&mut self, line: u32, scope: Scope) {
        match self.lines.get_mut(&line) {
            Some(existing) => existing.extend(scope),
            None => {
                self.lines.insert(line, scope);
            }
        }
    }
}

/// Extract pragmas from source text.
pub fn parse(source: &str) -> Pragmas {
    let mut pragmas = Pragmas::default();

    for (idx, text) in source.lines().enumerate() {
        let line = idx as u32 + 1;
        let Some(hash) = comment_start(text) else {
            continue;
        };
        let whole_line = text[..hash].trim().is_empty();
        let comment = text[hash..].trim_start_matches('#').trim();

        let Some(directive) = comment.strip_prefix("dclint-disable") else {
            continue;
        };

        if let Some(rest) = directive.strip_prefix("-line") {
            pragmas.disable_line(line, Scope::from_list(parse_rule_list(rest)));
        } else if !whole_line {
            // Only `-line` may trail a value.
            continue;
        } else if let Some(rest) = directive.strip_prefix("-next-line") {
            pragmas.disable_line(line + 1, Scope::from_list(parse_rule_list(rest)));
        } else if let Some(rest) = directive.strip_prefix("-file") {
            let scope = Scope::from_list(parse_rule_list(rest));
            match pragmas.file.as_mut() {
                Some(existing) => existing.extend(scope),
                None => pragmas.file = Some(scope),
            }
        } else if directive.is_empty() || directive.starts_with(char::is_whitespace) {
            pragmas
                .from_line
                .push((line, Scope::from_list(parse_rule_list(directive))));
        }
    }

    pragmas
}

/// Byte offset of the `#` starting a YAML comment, skipping quoted scalars.
/// A comment `#` is at line start or follows whitespace.
fn comment_start(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            // `''` inside a single-quoted scalar is an escaped quote.
            None if c == '\'' && prev == Some('\'') => quote = Some(c),
            None => match c {
                '#' if prev.is_none_or(char::is_whitespace) => return Some(idx),
                '"' | '\'' if prev.is_none_or(|p| p.is_whitespace() || matches!(p, '[' | '{' | ',' | ':')) => {
                    quote = Some(c)
                }
                _ => {}
            },
        }
        prev = Some(c);
    }

    None
}

/// Parse a comma- or whitespace-separated list of rule ids.
fn parse_rule_list(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
