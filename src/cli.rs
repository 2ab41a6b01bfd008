use clap::Parser;
use std::path::PathBuf;

/// Regex find/replace (and download) over files selected by glob patterns.
///
/// Every option can also be supplied through the environment using the
/// `INPUT_<NAME>` convention of CI action steps, so the binary runs unchanged
/// as a workflow step. Command-line values take precedence over the
/// environment, which takes precedence over a settings file.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Find and replace across files selected by glob patterns",
    long_about = "findrep - walk a directory, select files with include/exclude globs and \
run a regex find/replace over their contents.

In download mode every match is treated as a URL: it is fetched into a file
whose path is built from --target (relative to the matching file), and the
source can optionally be rewritten to point at the downloaded copy.

EXAMPLES:
  findrep --include '*.md' --exclude 'node_modules/*' --find 'v1\\.0\\.0' --target v1.1.0
  findrep --include '**/*.md' --exclude 'vendor/*' --download true --replace false \\
          --find 'https://example.com/(\\w+)\\.png' --target 'images/$1.png'

The number of modified files is printed as
  ::set-output name=modifiedFiles::<N>"
)]
pub struct Args {
    /// Glob selecting files to process, relative to --dir.
    #[arg(long, env = "INPUT_INCLUDE")]
    pub include: Option<String>,

    /// Glob rejecting files even when --include selects them.
    #[arg(long, env = "INPUT_EXCLUDE")]
    pub exclude: Option<String>,

    /// Regular expression to search for.
    #[arg(long, env = "INPUT_FIND")]
    pub find: Option<String>,

    /// Replacement text or download path template; `$1`/`${name}` expand capture groups.
    #[arg(long, env = "INPUT_TARGET")]
    pub target: Option<String>,

    /// Rewrite source files with the replaced content [default: true].
    #[arg(long, env = "INPUT_REPLACE")]
    pub replace: Option<String>,

    /// Strip metadata from downloaded images [default: false].
    #[arg(long = "strip-metadata", visible_alias = "remove-exif", env = "INPUT_REMOVEEXIF")]
    pub strip_metadata: Option<String>,

    /// Treat every match as a URL and download it [default: false].
    #[arg(long, env = "INPUT_DOWNLOAD")]
    pub download: Option<String>,

    /// The directory to walk.
    #[arg(short, long, env = "INPUT_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Optional YAML settings file providing defaults for the options above.
    #[arg(short, long, env = "INPUT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
