use crate::errors::Result;
use globset::{Glob, GlobMatcher as CompiledGlob};
use std::path::Path;

/// An include/exclude pair of compiled glob patterns.
///
/// Patterns are evaluated against paths relative to the walk root. A single
/// `*` may cross `/`, so `*.md` selects `docs/readme.md` and `node_modules/*`
/// rejects everything below `node_modules`.
#[derive(Clone, Debug)]
pub struct GlobMatcher {
    include: CompiledGlob,
    exclude: CompiledGlob,
}

impl GlobMatcher {
    /// Compiles both patterns. A malformed pattern is a configuration error.
    pub fn new(include: &str, exclude: &str) -> Result<Self> {
        Ok(Self {
            include: Glob::new(include)?.compile_matcher(),
            exclude: Glob::new(exclude)?.compile_matcher(),
        })
    }

    /// Returns `true` iff `path` matches the include pattern and not the
    /// exclude pattern.
    pub fn is_match(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

/// One-shot form of [`GlobMatcher::is_match`] that compiles the patterns first.
pub fn matches(path: &Path, include: &str, exclude: &str) -> Result<bool> {
    Ok(GlobMatcher::new(include, exclude)?.is_match(path))
}
