//! Bulkfetch Core Library
//!
//! This library provides the core functionality for the `bulkfetch` tool,
//! which gathers URLs from heterogeneous sources (literal lists, line files,
//! standard input, CSV, JSON, sitemaps) and downloads them concurrently into
//! an output directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`source`] - URL validation and the source loaders
//! - [`download`] - HTTP client, retry policy and destination path resolution
//! - [`queue`] - Work queue connecting fetch producers to persist consumers
//! - [`pipeline`] - Producer/consumer coordinator and the run report
//! - [`config`] - Run configuration, defaults and the TOML config file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod pipeline;
pub mod queue;
pub mod source;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, FileConfig, RunConfig};
pub use download::{DownloadError, HttpClient, RetryDecision, RetryPolicy, resolve_destination};
pub use pipeline::{Pipeline, PipelineError, RunReport, UrlOutcome};
pub use queue::{FetchResult, QueueError, QueueMessage, WorkQueue};
pub use source::{SourceConfig, SourceError, is_valid_url, load_urls};
