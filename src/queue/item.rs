//! Messages carried by the work queue.

use std::path::PathBuf;

/// A successfully fetched URL waiting to be persisted.
///
/// Created once per fetched URL by a producer and consumed by exactly one
/// consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// The URL the payload was fetched from.
    pub url: String,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Resolved destination path.
    pub destination: PathBuf,
}

impl FetchResult {
    /// Creates a new fetch result.
    #[must_use]
    pub fn new(url: impl Into<String>, body: Vec<u8>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            body,
            destination: destination.into(),
        }
    }
}

/// A value on the work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage {
    /// A payload to persist.
    Fetched(FetchResult),
    /// Sentinel: the consumer taking this message stops.
    Shutdown,
}
