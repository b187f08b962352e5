//! HTTP fetching, retry policy, and destination path resolution.
//!
//! # Features
//!
//! - Shared HTTP client with a per-request timeout
//! - Exponential backoff retry policy (`base * 2^(attempt-1)`)
//! - Pure destination path resolution with traversal sanitization
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use bulkfetch_core::download::{HttpClient, resolve_destination};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Duration::from_secs(15))?;
//! let url = "https://example.com/papers/paper.pdf";
//! let body = client.fetch(url).await?;
//! let destination = resolve_destination(url, Path::new("./downloads"), true);
//! std::fs::create_dir_all(destination.parent().unwrap_or(Path::new(".")))?;
//! std::fs::write(&destination, body)?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod destination;
mod error;
mod retry;

pub use client::HttpClient;
pub use destination::resolve_destination;
pub use error::DownloadError;
pub use retry::{RetryDecision, RetryPolicy};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
