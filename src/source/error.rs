//! Error types for source loaders.
//!
//! These never abort a run: the public loaders log them and contribute an
//! empty set instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::DownloadError;

/// Errors that can occur while loading URLs from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The source file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV header could not be read.
    #[error("failed to read CSV {path}: {source}")]
    Csv {
        /// The CSV file path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The requested CSV column is absent from the header.
    #[error("CSV column '{column}' not found in {path}. Columns: [{available}]")]
    MissingColumn {
        /// The CSV file path.
        path: PathBuf,
        /// The requested column.
        column: String,
        /// Comma-separated header names that do exist.
        available: String,
    },

    /// The JSON document could not be parsed.
    #[error("failed to parse JSON from {path}: {source}")]
    Json {
        /// The JSON file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The sitemap document is not well-formed XML.
    #[error("failed to parse sitemap {origin}: {message}")]
    Xml {
        /// Sitemap path or URL.
        origin: String,
        /// Parser error message.
        message: String,
    },

    /// The remote sitemap could not be fetched.
    #[error("failed to fetch sitemap: {0}")]
    Fetch(#[from] DownloadError),
}

impl SourceError {
    /// Creates an IO error for a source file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an XML parse error for a sitemap.
    pub fn xml(origin: impl Into<String>, message: impl ToString) -> Self {
        Self::Xml {
            origin: origin.into(),
            message: message.to_string(),
        }
    }
}
