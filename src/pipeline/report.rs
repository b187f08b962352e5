//! Per-run outcome tracking.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// What happened to one URL during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    /// The payload was written to `path`.
    Saved {
        /// Destination file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The destination already existed and skip-existing was enabled.
    SkippedExisting {
        /// Existing destination file.
        path: PathBuf,
    },
    /// Every fetch attempt failed; nothing was enqueued.
    FetchFailed {
        /// Attempts made.
        attempts: u32,
        /// Final error message.
        error: String,
    },
    /// The payload was fetched but could not be written.
    PersistFailed {
        /// Intended destination file.
        path: PathBuf,
        /// Error message.
        error: String,
    },
}

/// Counts and per-URL outcomes for one pipeline run.
///
/// Updated concurrently by producers and consumers; read after the queue has
/// drained.
#[derive(Debug, Default)]
pub struct RunReport {
    saved: AtomicUsize,
    skipped: AtomicUsize,
    pre_skipped: AtomicUsize,
    fetch_failed: AtomicUsize,
    persist_failed: AtomicUsize,
    retried: AtomicUsize,
    outcomes: Mutex<BTreeMap<String, UrlOutcome>>,
}

impl RunReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files written.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    /// URLs skipped because the destination existed, whether filtered before
    /// fetching or found by a consumer.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// URLs filtered out before any fetch because the destination existed.
    #[must_use]
    pub fn pre_skipped(&self) -> usize {
        self.pre_skipped.load(Ordering::SeqCst)
    }

    /// URLs whose fetch attempts were all exhausted.
    #[must_use]
    pub fn fetch_failed(&self) -> usize {
        self.fetch_failed.load(Ordering::SeqCst)
    }

    /// Fetched payloads that could not be written.
    #[must_use]
    pub fn persist_failed(&self) -> usize {
        self.persist_failed.load(Ordering::SeqCst)
    }

    /// Retry attempts made across all URLs.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Total URLs with a recorded outcome.
    #[must_use]
    pub fn total(&self) -> usize {
        self.saved() + self.skipped() + self.fetch_failed() + self.persist_failed()
    }

    /// Returns `true` if any URL failed to fetch or persist.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.fetch_failed() > 0 || self.persist_failed() > 0
    }

    /// Outcome recorded for `url`, if any.
    #[must_use]
    pub fn outcome(&self, url: &str) -> Option<UrlOutcome> {
        self.lock().get(url).cloned()
    }

    /// Snapshot of every recorded outcome, ordered by URL.
    #[must_use]
    pub fn outcomes(&self) -> BTreeMap<String, UrlOutcome> {
        self.lock().clone()
    }

    /// Copies the current counts and outcomes into a new report.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        let load = |counter: &AtomicUsize| AtomicUsize::new(counter.load(Ordering::SeqCst));
        Self {
            saved: load(&self.saved),
            skipped: load(&self.skipped),
            pre_skipped: load(&self.pre_skipped),
            fetch_failed: load(&self.fetch_failed),
            persist_failed: load(&self.persist_failed),
            retried: load(&self.retried),
            outcomes: Mutex::new(self.outcomes()),
        }
    }

    pub(crate) fn record_pre_skipped(&self, url: &str, path: PathBuf) {
        self.pre_skipped.fetch_add(1, Ordering::SeqCst);
        self.record(url, UrlOutcome::SkippedExisting { path });
    }

    pub(crate) fn record_retry(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record(&self, url: &str, outcome: UrlOutcome) {
        let counter = match &outcome {
            UrlOutcome::Saved { .. } => &self.saved,
            UrlOutcome::SkippedExisting { .. } => &self.skipped,
            UrlOutcome::FetchFailed { .. } => &self.fetch_failed,
            UrlOutcome::PersistFailed { .. } => &self.persist_failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(url.to_string(), outcome);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, UrlOutcome>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_default_is_empty() {
        let report = RunReport::new();
        assert_eq!(report.total(), 0);
        assert!(!report.has_failures());
        assert!(report.outcomes().is_empty());
    }

    #[test]
    fn test_record_updates_counts_and_outcomes() {
        let report = RunReport::new();
        report.record(
            "http://h/a",
            UrlOutcome::Saved {
                path: PathBuf::from("out/a"),
                bytes: 3,
            },
        );
        report.record(
            "http://h/b",
            UrlOutcome::FetchFailed {
                attempts: 2,
                error: "HTTP 500".to_string(),
            },
        );
        report.record_pre_skipped("http://h/c", PathBuf::from("out/c"));
        report.record_retry();

        assert_eq!(report.saved(), 1);
        assert_eq!(report.fetch_failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.pre_skipped(), 1);
        assert_eq!(report.retried(), 1);
        assert_eq!(report.total(), 3);
        assert!(report.has_failures());
        assert_eq!(
            report.outcome("http://h/c"),
            Some(UrlOutcome::SkippedExisting {
                path: PathBuf::from("out/c")
            })
        );
        assert_eq!(report.outcome("http://h/missing"), None);

        let copy = report.snapshot();
        assert_eq!(copy.total(), 3);
        assert_eq!(copy.pre_skipped(), 1);
        assert_eq!(copy.outcomes(), report.outcomes());
    }
}
