//! The main entry point for the `findrep` command-line application.
//!
//! Resolves settings from arguments, the environment and an optional settings
//! file, runs the find/replace over the selected files and prints the
//! modified-file count for the invoking workflow.

use anyhow::Context;
use findrep::cli;
use findrep::config::ConfigLoader;
use findrep::runner;
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = cli::parse_args();
    let settings = ConfigLoader::resolve(args).context("invalid configuration")?;
    let mode = runner::mode_for(&settings);

    let summary = runner::run(&settings, mode)?;
    log::info!(
        "Files scanned: {}, files modified: {}",
        summary.scanned,
        summary.modified
    );

    let github_output = env::var_os("GITHUB_OUTPUT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    runner::emit_summary(&mut std::io::stdout(), &summary, github_output.as_deref())?;
    Ok(())
}
