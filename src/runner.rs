use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::fetcher::HttpFetcher;
use crate::glob_matcher::GlobMatcher;
use crate::metadata::{ImageMetadataStripper, MetadataStripper};
use crate::replacer::{Downloader, Mode, Replacer};
use crate::walker;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Output key under which the modified-file count is published.
pub const OUTPUT_KEY: &str = "modifiedFiles";

/// Aggregate result of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Files processed.
    pub scanned: usize,
    /// Files whose processing counted as a modification.
    pub modified: usize,
}

/// Builds the operating mode from resolved settings, wiring the HTTP fetcher
/// and image stripper when downloading.
pub fn mode_for(settings: &Settings) -> Mode {
    if !settings.download {
        return Mode::Plain {
            rewrite: settings.replace,
        };
    }

    let stripper = settings
        .strip_metadata
        .then(|| Box::new(ImageMetadataStripper) as Box<dyn MetadataStripper>);
    Mode::Download(Downloader::new(
        Box::new(HttpFetcher::new()),
        stripper,
        settings.replace,
    ))
}

/// Drives a complete run: compile patterns, walk, process every file in
/// traversal order and count modifications.
///
/// All patterns are compiled before the first file is touched. The first
/// error aborts the run; changes already written are kept.
pub fn run(settings: &Settings, mode: Mode) -> Result<RunSummary> {
    let spec = &settings.spec;
    let matcher = GlobMatcher::new(&spec.include, &spec.exclude)?;
    let replacer = Replacer::new(spec, mode)?;

    let files = walker::walk(&settings.root, &matcher)?;
    log::info!(
        "{} file(s) under {} match include {:?} / exclude {:?}",
        files.len(),
        settings.root.display(),
        spec.include,
        spec.exclude
    );

    let mut summary = RunSummary::default();
    for path in &files {
        let result = replacer.process_file(path)?;
        summary.scanned += 1;
        if result.modified {
            summary.modified += 1;
            log::info!("Modified {} ({} matches)", path.display(), result.matches);
        } else {
            log::debug!("Unchanged {} ({} matches)", path.display(), result.matches);
        }
    }

    Ok(summary)
}

/// Formats the machine-readable result line.
pub fn set_output_line(summary: &RunSummary) -> String {
    format!("::set-output name={OUTPUT_KEY}::{}", summary.modified)
}

/// Publishes the modified-file count.
///
/// The `::set-output` line is always written to `out`. When `github_output`
/// names a file, `modifiedFiles=<N>` is appended to it as well.
pub fn emit_summary<W: Write>(
    out: &mut W,
    summary: &RunSummary,
    github_output: Option<&Path>,
) -> Result<()> {
    writeln!(out, "{}", set_output_line(summary))?;

    if let Some(path) = github_output {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::file(path, e))?;
        writeln!(file, "{OUTPUT_KEY}={}", summary.modified).map_err(|e| Error::file(path, e))?;
    }

    Ok(())
}
