use crate::cli::Args;
use crate::errors::{ConfigError, Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The four values that drive a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    /// Glob selecting candidate files.
    pub include: String,
    /// Glob rejecting candidate files.
    pub exclude: String,
    /// Regular expression to search for.
    pub find: String,
    /// Replacement text or download path template.
    pub target: String,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory walked for candidate files.
    pub root: PathBuf,
    pub spec: PatternSpec,
    /// Rewrite source files with the replaced content.
    pub replace: bool,
    /// Strip metadata from downloaded images.
    pub strip_metadata: bool,
    /// Treat matches as URLs to download.
    pub download: bool,
}

/// Settings read from an optional YAML file. Every key is optional; values
/// given on the command line or in the environment win.
///
/// ```yaml
/// include: "**/*.md"
/// exclude: "node_modules/*"
/// find: 'v1\.0\.0'
/// target: v1.1.0
/// replace: true
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub find: Option<String>,
    pub target: Option<String>,
    pub replace: Option<bool>,
    #[serde(alias = "remove_exif", alias = "removeExif")]
    pub strip_metadata: Option<bool>,
    pub download: Option<bool>,
}

/// A utility for locating and loading settings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds a settings file given on the command line.
    ///
    /// The search order is:
    /// 1. `config_path` as given (absolute, or relative to the current directory).
    /// 2. `config_path` relative to the walk root.
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_working_dir = working_dir.join(config_path);
        if in_working_dir.exists() {
            return Ok(in_working_dir);
        }

        Err(Error::file(
            config_path,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "settings file not found (also tried {})",
                    in_working_dir.display()
                ),
            ),
        ))
    }

    /// Loads a `SettingsFile` from a YAML file.
    pub fn load_settings_file(path: &Path) -> Result<SettingsFile> {
        let file = File::open(path).map_err(|e| Error::file(path, e))?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Merges command-line/environment values over an optional settings file
    /// and validates the result.
    pub fn resolve(args: Args) -> Result<Settings> {
        let file = match &args.config {
            Some(path) => {
                let resolved = Self::find_config(path, &args.dir)?;
                log::info!("Using settings file: {}", resolved.display());
                Self::load_settings_file(&resolved)?
            }
            None => SettingsFile::default(),
        };

        let spec = PatternSpec {
            include: required("include", args.include, file.include)?,
            exclude: required("exclude", args.exclude, file.exclude)?,
            find: required("find", args.find, file.find)?,
            target: required("target", args.target, file.target)?,
        };

        Ok(Settings {
            root: args.dir,
            spec,
            replace: flag("replace", args.replace.as_deref(), file.replace, true)?,
            strip_metadata: flag(
                "strip_metadata",
                args.strip_metadata.as_deref(),
                file.strip_metadata,
                false,
            )?,
            download: flag("download", args.download.as_deref(), file.download, false)?,
        })
    }
}

/// Picks the first non-empty value, or reports the key as missing.
fn required(
    key: &'static str,
    given: Option<String>,
    from_file: Option<String>,
) -> Result<String> {
    given
        .filter(|v| !v.is_empty())
        .or(from_file.filter(|v| !v.is_empty()))
        .ok_or_else(|| ConfigError::Missing { key }.into())
}

fn flag(key: &'static str, given: Option<&str>, from_file: Option<bool>, default: bool) -> Result<bool> {
    match given.filter(|v| !v.is_empty()) {
        Some(value) => Ok(parse_flag(key, value)?),
        None => Ok(from_file.unwrap_or(default)),
    }
}

/// Parses a boolean in the spellings CI runners commonly pass through.
pub fn parse_flag(key: &'static str, value: &str) -> std::result::Result<bool, ConfigError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}
