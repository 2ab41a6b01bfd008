use crate::errors::{ConfigError, Result};
use regex::bytes::{Captures, Regex};
use regex_syntax::ParserBuilder;
use std::borrow::Cow;

/// A compiled `find` expression operating on raw file bytes.
///
/// Patterns that can match the empty string are rejected at construction,
/// so every match consumes at least one byte and scanning always advances.
#[derive(Clone, Debug)]
pub struct PatternEngine {
    regex: Regex,
}

/// A single occurrence of the find pattern, with its capture groups.
#[derive(Debug)]
pub struct Match<'h> {
    start: usize,
    end: usize,
    bytes: &'h [u8],
    captures: Captures<'h>,
}

impl PatternEngine {
    /// Compiles `find`, failing on syntax errors and on zero-width patterns.
    pub fn new(find: &str) -> Result<Self> {
        let regex = Regex::new(find)?;
        let hir = ParserBuilder::new().utf8(false).build().parse(find)?;
        if hir.properties().minimum_len() == Some(0) {
            return Err(ConfigError::EmptyMatch(find.to_string()).into());
        }
        Ok(Self { regex })
    }

    /// Leftmost, non-overlapping matches in scan order.
    pub fn find_all<'h>(&self, content: &'h [u8]) -> Vec<Match<'h>> {
        self.regex
            .captures_iter(content)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                Some(Match {
                    start: whole.start(),
                    end: whole.end(),
                    bytes: whole.as_bytes(),
                    captures,
                })
            })
            .collect()
    }

    /// Substitutes every match with `target`, expanding `$N`/`${name}` group
    /// references per match. Bytes outside matches are left untouched, and
    /// content without matches is returned borrowed.
    pub fn replace_all<'h>(&self, content: &'h [u8], target: &[u8]) -> Cow<'h, [u8]> {
        self.regex.replace_all(content, target)
    }
}

impl<'h> Match<'h> {
    /// Byte offset of the match within the scanned content.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always `false`; zero-width patterns are rejected at compile time.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The matched bytes.
    pub fn as_bytes(&self) -> &'h [u8] {
        self.bytes
    }

    /// Expands `template` against this match's capture groups.
    pub fn expand(&self, template: &[u8]) -> Vec<u8> {
        expand(template, &self.captures)
    }
}

/// Resolves group references in `template` against one match's captures.
///
/// Uses the engine's substitution syntax: `$1`, `${1}`, `$name`, `${name}`
/// and `$$` for a literal dollar. Unknown groups expand to nothing.
pub fn expand(template: &[u8], captures: &Captures<'_>) -> Vec<u8> {
    let mut expanded = Vec::with_capacity(template.len());
    captures.expand(template, &mut expanded);
    expanded
}
