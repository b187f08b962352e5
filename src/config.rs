//! Run configuration: built-in defaults, the optional TOML config file, and
//! the merged [`RunConfig`] consumed by the pipeline.
//!
//! Values are layered with [`FileConfig::layered_over`]: command-line
//! overrides sit on top of the config file, which sits on top of the
//! defaults applied by [`FileConfig::into_run_config`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded";

/// Default number of concurrent fetches.
pub const DEFAULT_PRODUCERS: usize = 3;

/// Default number of persist workers.
pub const DEFAULT_CONSUMERS: usize = 3;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 15.0;

/// Default retries per URL (0 means a single attempt).
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default base backoff in seconds.
pub const DEFAULT_RETRY_BACKOFF_SECS: f64 = 1.0;

/// Default CSV column holding URLs.
pub const DEFAULT_CSV_COLUMN: &str = "url";

/// Accepted range for the producer count.
pub const PRODUCERS_RANGE: std::ops::RangeInclusive<usize> = 1..=100;

/// Accepted range for the consumer count.
pub const CONSUMERS_RANGE: std::ops::RangeInclusive<usize> = 1..=64;

/// Upper bound on max retries.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound on timeout and backoff values, in seconds.
pub const MAX_SECS: f64 = 3600.0;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid value for `{field}`: {value}. Expected {expected}")]
    OutOfRange {
        /// Config key.
        field: &'static str,
        /// Offending value, rendered for display.
        value: String,
        /// Human-readable accepted range.
        expected: &'static str,
    },
}

impl ConfigError {
    fn out_of_range(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// TOML-backed file configuration. Every key is optional.
///
/// The command line builds the same shape from its flags so both layers can
/// be merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Output directory for downloads.
    pub out: Option<PathBuf>,
    /// Mirror the URL path hierarchy under the output directory.
    pub preserve_path: Option<bool>,
    /// Skip URLs whose destination already exists.
    pub skip_existing: Option<bool>,
    /// Concurrent fetches.
    pub producers: Option<usize>,
    /// Persist workers.
    pub consumers: Option<usize>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<f64>,
    /// Retries per URL after the first attempt.
    pub max_retries: Option<u32>,
    /// Base backoff in seconds, doubled on every retry.
    pub retry_backoff_secs: Option<f64>,
    /// CSV column holding URLs.
    pub csv_column: Option<String>,
}

impl FileConfig {
    /// Parses a TOML document into a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::OutOfRange`] for values outside their accepted range.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates present values against the same ranges as the CLI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(producers) = self.producers
            && !PRODUCERS_RANGE.contains(&producers)
        {
            return Err(ConfigError::out_of_range("producers", producers, "1..=100"));
        }
        if let Some(consumers) = self.consumers
            && !CONSUMERS_RANGE.contains(&consumers)
        {
            return Err(ConfigError::out_of_range("consumers", consumers, "1..=64"));
        }
        if let Some(max_retries) = self.max_retries
            && max_retries > MAX_RETRIES_LIMIT
        {
            return Err(ConfigError::out_of_range("max_retries", max_retries, "0..=10"));
        }
        if let Some(timeout) = self.timeout_secs
            && !(timeout.is_finite() && timeout > 0.0 && timeout <= MAX_SECS)
        {
            return Err(ConfigError::out_of_range(
                "timeout_secs",
                timeout,
                "a number of seconds in (0, 3600]",
            ));
        }
        if let Some(backoff) = self.retry_backoff_secs
            && !(backoff.is_finite() && (0.0..=MAX_SECS).contains(&backoff))
        {
            return Err(ConfigError::out_of_range(
                "retry_backoff_secs",
                backoff,
                "a number of seconds in [0, 3600]",
            ));
        }
        Ok(())
    }

    /// Returns a config where values set in `self` win over `lower`.
    #[must_use]
    pub fn layered_over(self, lower: &FileConfig) -> FileConfig {
        FileConfig {
            out: self.out.or_else(|| lower.out.clone()),
            preserve_path: self.preserve_path.or(lower.preserve_path),
            skip_existing: self.skip_existing.or(lower.skip_existing),
            producers: self.producers.or(lower.producers),
            consumers: self.consumers.or(lower.consumers),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            max_retries: self.max_retries.or(lower.max_retries),
            retry_backoff_secs: self.retry_backoff_secs.or(lower.retry_backoff_secs),
            csv_column: self.csv_column.or_else(|| lower.csv_column.clone()),
        }
    }

    /// Applies built-in defaults to unset values and builds a [`RunConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] if any present value is invalid.
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        self.validate()?;
        Ok(RunConfig {
            output_dir: self.out.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            preserve_path: self.preserve_path.unwrap_or(false),
            skip_existing: self.skip_existing.unwrap_or(false),
            producers: self.producers.unwrap_or(DEFAULT_PRODUCERS),
            consumers: self.consumers.unwrap_or(DEFAULT_CONSUMERS),
            timeout: Duration::from_secs_f64(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_backoff: Duration::from_secs_f64(
                self.retry_backoff_secs
                    .unwrap_or(DEFAULT_RETRY_BACKOFF_SECS),
            ),
        })
    }
}

/// Fully resolved settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Root directory every destination path is placed under.
    pub output_dir: PathBuf,
    /// Mirror the URL path hierarchy instead of flattening to the basename.
    pub preserve_path: bool,
    /// Skip URLs whose destination already exists.
    pub skip_existing: bool,
    /// Maximum concurrent fetches.
    pub producers: usize,
    /// Number of persist workers.
    pub consumers: usize,
    /// Timeout bounding a single HTTP attempt.
    pub timeout: Duration,
    /// Retries per URL after the first attempt.
    pub max_retries: u32,
    /// Base backoff; attempt `n` waits `retry_backoff * 2^(n-1)`.
    pub retry_backoff: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            preserve_path: false,
            skip_existing: false,
            producers: DEFAULT_PRODUCERS,
            consumers: DEFAULT_CONSUMERS,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_secs_f64(DEFAULT_RETRY_BACKOFF_SECS),
        }
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bulkfetch/config.toml`
/// 2. `$HOME/.config/bulkfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("bulkfetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("bulkfetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file at the default path, if one exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_default_file_config() -> Result<Option<FileConfig>, ConfigError> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file found");
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
/// errors of [`FileConfig::from_toml_str`].
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = FileConfig::from_toml_str(&raw, path)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}
