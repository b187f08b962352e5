//! Persist workers: drain the queue and write payloads to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::report::{RunReport, UrlOutcome};
use crate::queue::{FetchResult, QueueMessage, WorkQueue};

/// Errors writing one fetched payload.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The destination's parent directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Takes messages until a shutdown sentinel arrives, acknowledging each one.
///
/// Returns the number of payload messages handled.
pub(crate) async fn run_consumer(
    worker: usize,
    queue: WorkQueue,
    skip_existing: bool,
    report: Arc<RunReport>,
) -> usize {
    let mut handled = 0usize;
    loop {
        match queue.get().await {
            Some(QueueMessage::Fetched(result)) => {
                let outcome = match persist(&result, skip_existing).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(worker, url = %result.url, error = %e, "persist failed");
                        UrlOutcome::PersistFailed {
                            path: result.destination.clone(),
                            error: e.to_string(),
                        }
                    }
                };
                report.record(&result.url, outcome);
                handled += 1;
                queue.task_done();
            }
            Some(QueueMessage::Shutdown) => {
                debug!(worker, handled, "consumer stopping");
                queue.task_done();
                return handled;
            }
            None => {
                debug!(worker, handled, "queue closed");
                return handled;
            }
        }
    }
}

async fn persist(result: &FetchResult, skip_existing: bool) -> Result<UrlOutcome, PersistError> {
    let path = &result.destination;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    if skip_existing && tokio::fs::try_exists(path).await.unwrap_or(false) {
        info!(path = %path.display(), "skipping existing file");
        return Ok(UrlOutcome::SkippedExisting { path: path.clone() });
    }

    tokio::fs::write(path, &result.body)
        .await
        .map_err(|source| PersistError::Write {
            path: path.clone(),
            source,
        })?;
    info!(url = %result.url, path = %path.display(), bytes = result.body.len(), "saved");

    Ok(UrlOutcome::Saved {
        path: path.clone(),
        bytes: u64::try_from(result.body.len()).unwrap_or(u64::MAX),
    })
}

async fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}
