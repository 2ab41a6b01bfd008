use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `findrep`.
///
/// Every variant is fatal: the run orchestrator propagates it to the binary,
/// which terminates the process. Recoverable metadata-stripping failures use
/// [`crate::metadata::StripError`] instead and never become an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// A missing or malformed configuration value.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// An error that occurred while parsing a YAML settings file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An include or exclude glob failed to compile.
    #[error("Glob compilation failed: {0}")]
    Glob(#[from] globset::Error),

    /// An error that occurred during regex compilation.
    #[error("Pattern compilation failed: {0}")]
    Regex(#[from] regex::Error),

    /// The find pattern could not be analysed.
    #[error("Pattern analysis failed: {0}")]
    RegexSyntax(#[from] Box<regex_syntax::Error>),

    /// An error from the `walkdir` crate while traversing the tree.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A file could not be read or written.
    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An error related to file system I/O without a specific path.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    /// The HTTP transport failed while fetching a URL.
    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },

    /// The server answered a fetch with a non-success status.
    #[error("Fetch failed for {url}: HTTP status {status}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Configuration problems, reported before any file is touched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value was absent or empty.
    #[error("expected `{key}` to be a non-empty string")]
    Missing { key: &'static str },

    /// A boolean value could not be parsed.
    #[error("invalid boolean for `{key}`: {value:?}")]
    InvalidFlag { key: &'static str, value: String },

    /// The find pattern can match the empty string.
    #[error("find pattern {0:?} can match an empty string")]
    EmptyMatch(String),
}

/// A convenient type alias for `Result<T, findrep::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}

impl From<regex_syntax::Error> for Error {
    fn from(e: regex_syntax::Error) -> Self {
        Error::RegexSyntax(Box::new(e))
    }
}
