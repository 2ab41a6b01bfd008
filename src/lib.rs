//! `findrep` is a library for glob-selected, regex-driven file rewriting.
//!
//! It provides the core logic for the `findrep` CI step but can also be used
//! as a standalone library. The main components are:
//!
//! - `glob_matcher` and `walker`: select files under a root with include and
//!   exclude globs, in deterministic lexical order.
//! - `patterns`: the compiled find expression, match enumeration, replacement
//!   and capture-group expansion.
//! - `Replacer`: processes one file at a time, either substituting matches in
//!   place or downloading each match as a URL into a sibling file.
//! - `fetcher` and `metadata`: the HTTP download and image metadata-stripping
//!   collaborators used by download mode.
//! - `runner`: drives a run and reports the modified-file count.
//!
//! Processing is strictly sequential and every error except a failed metadata
//! strip aborts the run.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod glob_matcher;
pub mod metadata;
pub mod patterns;
pub mod replacer;
pub mod runner;
pub mod walker;

// Re-export main types for easier access by library users.
pub use config::{ConfigLoader, PatternSpec, Settings};
pub use errors::{ConfigError, Error, Result};
pub use replacer::{Mode, ProcessResult, Replacer};
pub use runner::RunSummary;
