//! URL sources: validation and the loaders that feed the pipeline.
//!
//! Every loader returns a set of validated URLs. Invalid entries are dropped
//! with a warning, and a loader that fails outright (missing file, bad JSON,
//! unreachable sitemap) logs the failure and contributes an empty set, so one
//! bad source never stops the others.
//!
//! # Supported Sources
//!
//! - Literal URLs given on the command line
//! - Line-delimited files and standard input
//! - A named CSV column
//! - JSON documents, optionally addressed by a dotted key-path
//! - Sitemap XML, local or remote (`<loc>` elements)
//!
//! # Example
//!
//! ```
//! use bulkfetch_core::source::load_from_list;
//!
//! let urls = load_from_list(["https://example.com/a.pdf", "ftp://nope", "https://example.com/a.pdf"]);
//! assert_eq!(urls.len(), 1);
//! ```

mod csv;
mod error;
mod json;
mod lines;
mod sitemap;
mod url;

pub use self::csv::load_from_csv;
pub use self::error::SourceError;
pub use self::json::{extract_json_urls, load_from_json};
pub use self::lines::{load_from_file, load_from_list, load_from_reader, load_from_stdin};
pub use self::sitemap::{extract_sitemap_locs, load_from_sitemap};
pub use self::url::is_valid_url;

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::config::DEFAULT_CSV_COLUMN;
use crate::download::HttpClient;

/// Which sources to read URLs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Literal URLs.
    pub urls: Vec<String>,
    /// Line-delimited URL file.
    pub file: Option<PathBuf>,
    /// Read line-delimited URLs from standard input.
    pub stdin: bool,
    /// CSV file containing URLs.
    pub csv: Option<PathBuf>,
    /// CSV column holding URLs.
    pub csv_column: String,
    /// JSON file containing URLs.
    pub json: Option<PathBuf>,
    /// Dotted key-path into the JSON document.
    pub json_key: Option<String>,
    /// Sitemap path or URL.
    pub sitemap: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            file: None,
            stdin: false,
            csv: None,
            csv_column: DEFAULT_CSV_COLUMN.to_string(),
            json: None,
            json_key: None,
            sitemap: None,
        }
    }
}

impl SourceConfig {
    /// Returns `true` if no source is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
            && self.file.is_none()
            && !self.stdin
            && self.csv.is_none()
            && self.json.is_none()
            && self.sitemap.is_none()
    }
}

/// Loads every enabled source and returns the deduplicated union.
///
/// Sources are read in a fixed order: literal URLs, line file, standard
/// input, CSV, JSON, sitemap. The sitemap is fetched with `client` when it
/// is a URL.
#[instrument(skip(config, client))]
pub async fn load_urls(config: &SourceConfig, client: &HttpClient) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();

    if !config.urls.is_empty() {
        merge(&mut urls, "list", load_from_list(&config.urls));
    }
    if let Some(path) = &config.file {
        merge(&mut urls, "file", load_from_file(path));
    }
    if config.stdin {
        merge(&mut urls, "stdin", load_from_stdin().await);
    }
    if let Some(path) = &config.csv {
        merge(&mut urls, "csv", load_from_csv(path, &config.csv_column));
    }
    if let Some(path) = &config.json {
        merge(
            &mut urls,
            "json",
            load_from_json(path, config.json_key.as_deref()),
        );
    }
    if let Some(origin) = &config.sitemap {
        merge(&mut urls, "sitemap", load_from_sitemap(origin, client).await);
    }

    info!(urls = urls.len(), "loaded URLs from sources");
    urls
}

fn merge(urls: &mut BTreeSet<String>, source: &str, loaded: BTreeSet<String>) {
    let before = urls.len();
    let count = loaded.len();
    urls.extend(loaded);
    debug!(
        source,
        loaded = count,
        new = urls.len() - before,
        "merged source"
    );
}

/// Trims `candidate` and inserts it if it is a valid URL.
///
/// Blank candidates are skipped silently; invalid ones are logged.
pub(crate) fn insert_if_valid(urls: &mut BTreeSet<String>, candidate: &str, origin: &str) {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return;
    }
    if is_valid_url(candidate) {
        urls.insert(candidate.to_string());
    } else {
        warn!(source = origin, url = %candidate, "ignored invalid URL");
    }
}
