//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use bulkfetch_core::config::{DEFAULT_CSV_COLUMN, MAX_SECS};
use bulkfetch_core::{FileConfig, SourceConfig};

/// Concurrently download every URL gathered from lists, files, CSV, JSON and
/// sitemaps.
///
/// Options not given on the command line fall back to the config file, then
/// to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "bulkfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Literal URLs to download
    #[arg(long, num_args = 1.., value_name = "URL")]
    pub urls: Vec<String>,

    /// Newline-delimited file of URLs
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Read newline-delimited URLs from standard input
    #[arg(long)]
    pub stdin: bool,

    /// CSV file containing URLs
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// CSV column holding URLs [default: url]
    #[arg(long, value_name = "NAME")]
    pub csv_column: Option<String>,

    /// JSON file containing URLs
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Dotted key-path into the JSON document (e.g. data.files)
    #[arg(long, value_name = "KEYPATH")]
    pub json_key: Option<String>,

    /// Sitemap file path or URL
    #[arg(long, value_name = "PATH|URL")]
    pub sitemap: Option<String>,

    /// Output directory [default: downloaded]
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Mirror the URL path hierarchy under the output directory
    #[arg(long)]
    pub preserve_path: bool,

    /// Skip URLs whose destination file already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Maximum concurrent fetches (1-100) [default: 3]
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub producers: Option<u8>,

    /// Persist workers (1-64) [default: 3]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub consumers: Option<u8>,

    /// Request timeout in seconds, fractions allowed [default: 15]
    #[arg(short = 't', long, value_name = "SECS", value_parser = parse_timeout_secs)]
    pub timeout: Option<f64>,

    /// Retries per URL after the first attempt (0-10) [default: 0]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Base backoff in seconds, doubled on every retry [default: 1]
    #[arg(short = 'b', long, value_name = "SECS", value_parser = parse_backoff_secs)]
    pub retry_backoff: Option<f64>,

    /// Config file path [default: $XDG_CONFIG_HOME/bulkfetch/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Settings given on the command line, in the config file's shape.
    ///
    /// Absent flags stay `None` so lower layers can fill them in.
    pub fn overrides(&self) -> FileConfig {
        FileConfig {
            out: self.out.clone(),
            preserve_path: self.preserve_path.then_some(true),
            skip_existing: self.skip_existing.then_some(true),
            producers: self.producers.map(usize::from),
            consumers: self.consumers.map(usize::from),
            timeout_secs: self.timeout,
            max_retries: self.max_retries.map(u32::from),
            retry_backoff_secs: self.retry_backoff,
            csv_column: self.csv_column.clone(),
        }
    }

    /// Source selection, with the CSV column taken from the merged settings.
    pub fn source_config(&self, merged: &FileConfig) -> SourceConfig {
        SourceConfig {
            urls: self.urls.clone(),
            file: self.file.clone(),
            stdin: self.stdin,
            csv: self.csv.clone(),
            csv_column: merged
                .csv_column
                .clone()
                .unwrap_or_else(|| DEFAULT_CSV_COLUMN.to_string()),
            json: self.json.clone(),
            json_key: self.json_key.clone(),
            sitemap: self.sitemap.clone(),
        }
    }
}

fn parse_secs(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if !secs.is_finite() || !(0.0..=MAX_SECS).contains(&secs) {
        return Err(format!("must be between 0 and {MAX_SECS} seconds"));
    }
    Ok(secs)
}

fn parse_timeout_secs(raw: &str) -> Result<f64, String> {
    let secs = parse_secs(raw)?;
    if secs <= 0.0 {
        return Err("must be greater than 0 seconds".to_string());
    }
    Ok(secs)
}

fn parse_backoff_secs(raw: &str) -> Result<f64, String> {
    parse_secs(raw)
}
