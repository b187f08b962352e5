//! Error types for work queue operations.

use thiserror::Error;

/// Errors that can occur on the work queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The receiving side is gone, so the message can never be consumed.
    #[error("work queue is closed")]
    Closed,
}
