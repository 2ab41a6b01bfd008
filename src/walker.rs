use crate::errors::Result;
use crate::glob_matcher::GlobMatcher;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists every file under `root` accepted by the include/exclude globs.
///
/// See [`walk`] for ordering and error behaviour.
pub fn list_files(root: &Path, include: &str, exclude: &str) -> Result<Vec<PathBuf>> {
    let matcher = GlobMatcher::new(include, exclude)?;
    walk(root, &matcher)
}

/// Recursively enumerates files under `root`, filtering through `matcher`.
///
/// Entries are visited depth-first in lexical file-name order, so the result
/// is deterministic across runs. Only regular files are returned; directories
/// and symlinks are skipped, so a link is never rewritten in place. Globs are
/// tested against the path relative to `root`; the returned paths still carry
/// the `root` prefix so they can be opened directly.
///
/// The first traversal error (unreadable directory, broken entry) is returned
/// instead of being skipped.
pub fn walk(root: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if matcher.is_match(relative) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
