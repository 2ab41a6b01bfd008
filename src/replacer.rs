use crate::config::PatternSpec;
use crate::errors::{Error, Result};
use crate::fetcher::Fetcher;
use crate::metadata::MetadataStripper;
use crate::patterns::PatternEngine;
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Core engine for finding and replacing a pattern in files.
///
/// A `Replacer` is configured once per run with a compiled find pattern,
/// a target template and an operating [`Mode`]. It then processes files one
/// at a time, reporting whether each counts as modified.
pub struct Replacer {
    engine: PatternEngine,
    find: String,
    target: String,
    mode: Mode,
}

/// How matches are acted upon.
pub enum Mode {
    /// Substitute `target` for every match.
    Plain {
        /// When `false`, matches are reported but the file is never written.
        rewrite: bool,
    },
    /// Download every match as a URL to a path built from `target`.
    Download(Downloader),
}

/// Collaborators and switches for download mode.
pub struct Downloader {
    fetcher: Box<dyn Fetcher>,
    stripper: Option<Box<dyn MetadataStripper>>,
    rewrite: bool,
}

/// The result of processing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    /// The number of matches found in the file.
    pub matches: usize,
    /// `true` if the file counts towards the modified-file total.
    pub modified: bool,
}

impl ProcessResult {
    fn unchanged(matches: usize) -> Self {
        Self {
            matches,
            modified: false,
        }
    }
}

impl Downloader {
    /// Creates a downloader. Passing a `stripper` enables metadata stripping
    /// of every downloaded file; `rewrite` controls whether the source file is
    /// rewritten to reference the downloaded copies.
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        stripper: Option<Box<dyn MetadataStripper>>,
        rewrite: bool,
    ) -> Self {
        Self {
            fetcher,
            stripper,
            rewrite,
        }
    }
}

impl Replacer {
    /// Creates a new `Replacer`, compiling the find pattern.
    pub fn new(spec: &PatternSpec, mode: Mode) -> Result<Self> {
        Ok(Self {
            engine: PatternEngine::new(&spec.find)?,
            find: spec.find.clone(),
            target: spec.target.clone(),
            mode,
        })
    }

    /// Processes a single file according to the configured mode.
    ///
    /// A `find` equal to `target` is a declared no-op: the file is read but
    /// never changed, fetched from or written to.
    pub fn process_file(&self, path: &Path) -> Result<ProcessResult> {
        let content = fs::read(path).map_err(|e| Error::file(path, e))?;
        if self.find == self.target {
            return Ok(ProcessResult::unchanged(0));
        }

        match &self.mode {
            Mode::Plain { rewrite } => self.replace_in_place(path, &content, *rewrite),
            Mode::Download(downloader) => self.download_matches(path, &content, downloader),
        }
    }

    /// Plain mode: report each `match --> replacement` pair and rewrite the
    /// file when the replaced bytes differ from the original.
    fn replace_in_place(&self, path: &Path, content: &[u8], rewrite: bool) -> Result<ProcessResult> {
        let matches = self.engine.find_all(content);
        for m in &matches {
            println!(
                "{} --> {}",
                String::from_utf8_lossy(m.as_bytes()),
                String::from_utf8_lossy(&m.expand(self.target.as_bytes()))
            );
        }
        if matches.is_empty() {
            return Ok(ProcessResult::unchanged(0));
        }

        let modified = rewrite && self.rewrite_if_changed(path, content)?;
        Ok(ProcessResult {
            matches: matches.len(),
            modified,
        })
    }

    /// Download mode: fetch every match into a file next to `path`.
    ///
    /// A failed fetch aborts immediately; files downloaded for earlier
    /// matches stay on disk. Metadata stripping is best effort: on failure the
    /// downloaded bytes are kept as fetched and processing continues.
    ///
    /// Any match counts the file as modified, even when the source itself is
    /// not rewritten, because the downloads are side effects of this file.
    fn download_matches(
        &self,
        path: &Path,
        content: &[u8],
        downloader: &Downloader,
    ) -> Result<ProcessResult> {
        let base = path.parent().unwrap_or(Path::new(""));
        let matches = self.engine.find_all(content);

        for m in &matches {
            let url = String::from_utf8_lossy(m.as_bytes());
            let destination = resolve_target(base, &m.expand(self.target.as_bytes()));
            println!("{} --> {}", url, destination.display());

            let bytes = downloader.fetcher.fetch(&url)?;
            let bytes = match &downloader.stripper {
                Some(stripper) => match stripper.strip(&bytes) {
                    Ok(stripped) => stripped,
                    Err(e) => {
                        log::warn!(
                            "Keeping {} unstripped: {}",
                            destination.display(),
                            e
                        );
                        bytes
                    }
                },
                None => bytes,
            };
            write_download(&destination, &bytes)?;
        }

        // The source gets the expanded target, not the base-joined path, so links stay relative to it.
        if downloader.rewrite && !matches.is_empty() && self.rewrite_if_changed(path, content)? {
            return Ok(ProcessResult {
                matches: matches.len(),
                modified: true,
            });
        }

        Ok(ProcessResult {
            matches: matches.len(),
            modified: !matches.is_empty(),
        })
    }

    /// Replaces every match in `content` and writes the result over `path`
    /// when it differs. Returns whether a write happened.
    fn rewrite_if_changed(&self, path: &Path, content: &[u8]) -> Result<bool> {
        match self.engine.replace_all(content, self.target.as_bytes()) {
            Cow::Owned(new_content) if new_content != content => {
                write_atomic(path, &new_content)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Builds a download path from an expanded target, relative to the
/// directory holding the file the match came from.
pub fn resolve_target(base: &Path, expanded: &[u8]) -> PathBuf {
    base.join(String::from_utf8_lossy(expanded).as_ref())
}

/// Writes `bytes` over `path` via a temporary file in the same directory,
/// preserving the original permissions.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| Error::file(parent, e))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| Error::file(temp_file.path(), e))?;

    let perms = fs::metadata(path)
        .map_err(|e| Error::file(path, e))?
        .permissions();
    fs::set_permissions(temp_file.path(), perms).map_err(|e| Error::file(path, e))?;

    temp_file.persist(path)?;
    Ok(())
}

/// Creates or overwrites a downloaded file, creating parent directories.
fn write_download(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::file(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| Error::file(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ImageMetadataStripper, StripError};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Serves `body-of:<url>` for every URL except those listed as failing.
    #[derive(Default)]
    struct FakeFetcher {
        calls: Rc<RefCell<Vec<String>>>,
        failing: HashSet<String>,
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            if self.failing.contains(url) {
                return Err(Error::FetchStatus {
                    url: url.to_string(),
                    status: reqwest::StatusCode::NOT_FOUND,
                });
            }
            Ok(format!("body-of:{url}").into_bytes())
        }
    }

    struct UppercaseStripper;

    impl MetadataStripper for UppercaseStripper {
        fn strip(&self, bytes: &[u8]) -> std::result::Result<Vec<u8>, StripError> {
            Ok(bytes.to_ascii_uppercase())
        }
    }

    fn spec(find: &str, target: &str) -> PatternSpec {
        PatternSpec {
            include: "**".into(),
            exclude: "none".into(),
            find: find.into(),
            target: target.into(),
        }
    }

    fn plain(find: &str, target: &str) -> Replacer {
        Replacer::new(&spec(find, target), Mode::Plain { rewrite: true }).unwrap()
    }

    fn downloading(
        find: &str,
        target: &str,
        fetcher: FakeFetcher,
        stripper: Option<Box<dyn MetadataStripper>>,
        rewrite: bool,
    ) -> Replacer {
        let downloader = Downloader::new(Box::new(fetcher), stripper, rewrite);
        Replacer::new(&spec(find, target), Mode::Download(downloader)).unwrap()
    }

    const URLS: &str = "![a](https://example.com/logo.png)\n![b](https://example.com/icon.png)\n";
    const URL_FIND: &str = r"https://example\.com/(\w+)\.png";

    #[test]
    fn test_plain_replacement_and_idempotence() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(&readme, "Version v1.0.0 released").unwrap();
        let replacer = plain(r"v1\.0\.0", "v1.1.0");

        let first = replacer.process_file(&readme).unwrap();
        assert_eq!(first, ProcessResult { matches: 1, modified: true });
        assert_eq!(fs::read_to_string(&readme).unwrap(), "Version v1.1.0 released");

        let second = replacer.process_file(&readme).unwrap();
        assert!(!second.modified);
        assert_eq!(fs::read_to_string(&readme).unwrap(), "Version v1.1.0 released");
    }

    #[test]
    fn test_plain_file_without_match_is_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let other = temp_dir.path().join("other.md");
        fs::write(&other, "nothing here").unwrap();
        let before = fs::metadata(&other).unwrap().modified().unwrap();

        let result = plain(r"v1\.0\.0", "v1.1.0").process_file(&other).unwrap();

        assert_eq!(result, ProcessResult { matches: 0, modified: false });
        assert_eq!(fs::read_to_string(&other).unwrap(), "nothing here");
        assert_eq!(fs::metadata(&other).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn test_plain_rewrite_expands_groups() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("deps.toml");
        fs::write(&file, "serde = \"1.0\"\nregex = \"1.9\"\n").unwrap();

        let result = plain(r#"(\w+) = "(\d+)\.(\d+)""#, r#"$1 = "$2.$3.0""#)
            .process_file(&file)
            .unwrap();

        assert_eq!(result.matches, 2);
        assert!(result.modified);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "serde = \"1.0.0\"\nregex = \"1.9.0\"\n"
        );
    }

    #[test]
    fn test_plain_without_rewrite_only_reports() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, "old old").unwrap();
        let replacer = Replacer::new(&spec("old", "new"), Mode::Plain { rewrite: false }).unwrap();

        let result = replacer.process_file(&file).unwrap();

        assert_eq!(result, ProcessResult { matches: 2, modified: false });
        assert_eq!(fs::read_to_string(&file).unwrap(), "old old");
    }

    #[test]
    fn test_replacement_equal_to_match_is_not_a_modification() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, "keep abc").unwrap();

        let result = plain("a(b)c", "a${1}c").process_file(&file).unwrap();

        assert_eq!(result, ProcessResult { matches: 1, modified: false });
    }

    #[test]
    fn test_find_equal_to_target_is_a_no_op_in_every_mode() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("readme.md");
        fs::write(&file, "https://example.com/logo.png").unwrap();

        assert!(!plain("logo", "logo").process_file(&file).unwrap().modified);

        let calls = Rc::new(RefCell::new(Vec::new()));
        let fetcher = FakeFetcher {
            calls: Rc::clone(&calls),
            ..FakeFetcher::default()
        };
        let stripper: Box<dyn MetadataStripper> = Box::new(UppercaseStripper);
        let replacer = downloading(URL_FIND, URL_FIND, fetcher, Some(stripper), true);

        assert!(!replacer.process_file(&file).unwrap().modified);
        assert!(calls.borrow().is_empty());
        assert_eq!(fs::read_to_string(&file).unwrap(), "https://example.com/logo.png");
    }

    #[test]
    fn test_download_without_replace_counts_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(&readme, URLS).unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let fetcher = FakeFetcher {
            calls: Rc::clone(&calls),
            ..FakeFetcher::default()
        };

        let result = downloading(URL_FIND, "images/$1.png", fetcher, None, false)
            .process_file(&readme)
            .unwrap();

        assert_eq!(result, ProcessResult { matches: 2, modified: true });
        assert_eq!(
            *calls.borrow(),
            vec!["https://example.com/logo.png", "https://example.com/icon.png"]
        );
        let images = temp_dir.path().join("images");
        assert_eq!(
            fs::read_to_string(images.join("logo.png")).unwrap(),
            "body-of:https://example.com/logo.png"
        );
        assert_eq!(
            fs::read_to_string(images.join("icon.png")).unwrap(),
            "body-of:https://example.com/icon.png"
        );
        assert_eq!(fs::read_to_string(&readme).unwrap(), URLS);
    }

    #[test]
    fn test_download_paths_resolve_next_to_the_source_file() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let readme = nested.join("readme.md");
        fs::write(&readme, "see img.png").unwrap();

        downloading(r"(\w+)\.png", "assets/$1.png", FakeFetcher::default(), None, false)
            .process_file(&readme)
            .unwrap();

        assert!(nested.join("assets").join("img.png").is_file());
        assert!(!temp_dir.path().join("assets").exists());
        assert_eq!(
            resolve_target(Path::new("a/b"), b"assets/img.png"),
            Path::new("a/b").join("assets/img.png")
        );
    }

    #[test]
    fn test_download_with_replace_rewrites_source() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(&readme, URLS).unwrap();

        let result = downloading(URL_FIND, "images/$1.png", FakeFetcher::default(), None, true)
            .process_file(&readme)
            .unwrap();

        assert!(result.modified);
        assert_eq!(
            fs::read_to_string(&readme).unwrap(),
            "![a](images/logo.png)\n![b](images/icon.png)\n"
        );
    }

    #[test]
    fn test_download_with_no_matches_is_not_modified() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(&readme, "no links").unwrap();

        let result = downloading(URL_FIND, "images/$1.png", FakeFetcher::default(), None, true)
            .process_file(&readme)
            .unwrap();

        assert_eq!(result, ProcessResult { matches: 0, modified: false });
        assert!(!temp_dir.path().join("images").exists());
    }

    #[test]
    fn test_failed_fetch_aborts_and_keeps_earlier_downloads() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(
            &readme,
            "https://example.com/one.png https://example.com/two.png https://example.com/three.png",
        )
        .unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let fetcher = FakeFetcher {
            calls: Rc::clone(&calls),
            failing: HashSet::from(["https://example.com/two.png".to_string()]),
        };

        let result = downloading(URL_FIND, "images/$1.png", fetcher, None, true).process_file(&readme);

        assert!(matches!(result, Err(Error::FetchStatus { .. })));
        assert_eq!(calls.borrow().len(), 2);
        let images = temp_dir.path().join("images");
        assert!(images.join("one.png").is_file());
        assert!(!images.join("two.png").exists());
        assert!(!images.join("three.png").exists());
        assert!(fs::read_to_string(&readme).unwrap().contains("https://example.com/one.png"));
    }

    #[test]
    fn test_stripped_bytes_are_written() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(&readme, URLS).unwrap();
        let stripper: Box<dyn MetadataStripper> = Box::new(UppercaseStripper);

        downloading(URL_FIND, "$1.png", FakeFetcher::default(), Some(stripper), false)
            .process_file(&readme)
            .unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("logo.png")).unwrap(),
            "BODY-OF:HTTPS://EXAMPLE.COM/LOGO.PNG"
        );
    }

    #[test]
    fn test_strip_failure_keeps_download_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let readme = temp_dir.path().join("readme.md");
        fs::write(&readme, URLS).unwrap();
        let stripper: Box<dyn MetadataStripper> = Box::new(ImageMetadataStripper);

        let result = downloading(URL_FIND, "$1.png", FakeFetcher::default(), Some(stripper), false)
            .process_file(&readme)
            .unwrap();

        assert!(result.modified);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("logo.png")).unwrap(),
            "body-of:https://example.com/logo.png"
        );
        assert!(temp_dir.path().join("icon.png").is_file());
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.md");

        let result = plain("a", "b").process_file(&missing);

        assert!(matches!(result, Err(Error::File { path, .. }) if path == missing));
    }
}
