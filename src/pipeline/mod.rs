//! Pipeline coordinator: producers fetch, consumers persist.
//!
//! A run resolves a destination for every URL, filters out existing files
//! when asked to, then starts a fixed pool of consumer tasks and one producer
//! task per remaining URL. Producers hand fetched payloads to consumers
//! through a [`WorkQueue`]. Once every producer has finished, one shutdown
//! sentinel per consumer is enqueued and the run waits for the queue to
//! drain.
//!
//! Per-URL failures never fail the run; they are logged and recorded in the
//! returned [`RunReport`].
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use bulkfetch_core::{Pipeline, RunConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(RunConfig::default())?;
//! let urls = BTreeSet::from(["https://example.com/a.pdf".to_string()]);
//! let report = pipeline.run(urls).await?;
//! println!("saved {} of {}", report.saved(), report.total());
//! # Ok(())
//! # }
//! ```

mod consumer;
mod producer;
mod report;

pub use consumer::PersistError;
pub use report::{RunReport, UrlOutcome};

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::RunConfig;
use crate::download::{HttpClient, RetryPolicy, resolve_destination};
use crate::queue::{QueueMessage, WorkQueue};
use crate::source::{SourceConfig, load_urls};
use consumer::run_consumer;
use producer::{ProducerContext, run_producer};

/// Setup failures that stop a run before any URL is processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The output directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Concurrent fetch-and-persist pipeline for one configuration.
#[derive(Debug)]
pub struct Pipeline {
    config: RunConfig,
    client: HttpClient,
}

impl Pipeline {
    /// Creates a pipeline and its shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Client`] if the HTTP client cannot be built.
    pub fn new(config: RunConfig) -> Result<Self, PipelineError> {
        let client = HttpClient::new(config.timeout)?;
        Ok(Self { config, client })
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The shared HTTP client, also used to fetch remote sitemaps.
    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Loads URLs from `sources` and runs them.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run`].
    pub async fn run_from_sources(&self, sources: &SourceConfig) -> Result<RunReport, PipelineError> {
        let urls = load_urls(sources, &self.client).await;
        self.run(urls).await
    }

    /// Fetches and persists every URL in `urls`.
    ///
    /// Returns once every consumer has acknowledged its shutdown sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OutputDir`] if the output root cannot be
    /// created. Individual fetch or write failures are recorded in the report
    /// instead.
    #[instrument(skip(self, urls), fields(urls = urls.len(), output_dir = %self.config.output_dir.display()))]
    pub async fn run(&self, urls: BTreeSet<String>) -> Result<RunReport, PipelineError> {
        self.run_on(urls, WorkQueue::new()).await
    }

    async fn run_on(
        &self,
        urls: BTreeSet<String>,
        queue: WorkQueue,
    ) -> Result<RunReport, PipelineError> {
        let report = Arc::new(RunReport::new());

        if urls.is_empty() {
            info!("No URLs provided.");
            return Ok(unwrap_report(report));
        }

        let plan = self.plan(urls, &report).await;
        if plan.is_empty() {
            info!("Nothing to download.");
            return Ok(unwrap_report(report));
        }

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|source| PipelineError::OutputDir {
                path: self.config.output_dir.clone(),
                source,
            })?;

        info!(
            urls = plan.len(),
            producers = self.config.producers,
            consumers = self.config.consumers,
            "starting downloads"
        );

        let consumers: Vec<_> = (0..self.config.consumers)
            .map(|worker| {
                tokio::spawn(run_consumer(
                    worker,
                    queue.clone(),
                    self.config.skip_existing,
                    Arc::clone(&report),
                ))
            })
            .collect();

        let ctx = Arc::new(ProducerContext {
            client: self.client.clone(),
            policy: RetryPolicy::new(self.config.max_retries, self.config.retry_backoff),
            queue: queue.clone(),
            report: Arc::clone(&report),
            fetch_slots: Arc::new(Semaphore::new(self.config.producers.max(1))),
        });
        let producers: Vec<_> = plan
            .into_iter()
            .map(|(url, destination)| tokio::spawn(run_producer(url, destination, Arc::clone(&ctx))))
            .collect();

        debug!(task_count = producers.len(), "waiting for producers");
        for handle in producers {
            if let Err(e) = handle.await {
                warn!(error = %e, "producer task panicked");
            }
        }
        drop(ctx);

        for _ in 0..consumers.len() {
            if let Err(e) = queue.put(QueueMessage::Shutdown) {
                warn!(error = %e, "failed to enqueue shutdown sentinel");
            }
        }
        queue.join().await;
        debug!(pending = queue.pending(), "queue drained");

        for handle in consumers {
            if let Err(e) = handle.await {
                warn!(error = %e, "consumer task panicked");
            }
        }

        let report = unwrap_report(report);
        info!(
            saved = report.saved(),
            skipped = report.skipped(),
            fetch_failed = report.fetch_failed(),
            persist_failed = report.persist_failed(),
            retried = report.retried(),
            "downloads complete"
        );
        Ok(report)
    }

    /// Resolves destinations and drops URLs whose file already exists when
    /// skip-existing is on.
    async fn plan(&self, urls: BTreeSet<String>, report: &RunReport) -> Vec<(String, PathBuf)> {
        let mut plan = Vec::with_capacity(urls.len());
        for url in urls {
            let destination =
                resolve_destination(&url, &self.config.output_dir, self.config.preserve_path);
            debug!(url = %url, path = %destination.display(), "resolved destination");

            if self.config.skip_existing
                && tokio::fs::try_exists(&destination).await.unwrap_or(false)
            {
                report.record_pre_skipped(&url, destination);
                continue;
            }
            plan.push((url, destination));
        }

        if report.pre_skipped() > 0 {
            info!(skipped = report.pre_skipped(), "skipping existing files");
        }
        plan
    }
}

/// Takes the report back once every task holding a handle has finished.
fn unwrap_report(report: Arc<RunReport>) -> RunReport {
    Arc::try_unwrap(report).unwrap_or_else(|shared| shared.snapshot())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn pipeline(output_dir: PathBuf) -> Pipeline {
        Pipeline::new(RunConfig {
            output_dir,
            consumers: 2,
            timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_millis(5),
            ..RunConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_drains_queue() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x"))
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline(temp.path().join("out"));
        let queue = WorkQueue::new();
        let urls: BTreeSet<String> = (0..5).map(|i| format!("{}/f{i}", server.uri())).collect();

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            pipeline.run_on(urls, queue.clone()),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(queue.pending(), 0);
        assert_eq!(report.saved(), 5);
    }

    #[tokio::test]
    async fn test_empty_url_set_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let report = pipeline(out.clone()).run(BTreeSet::new()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(!out.exists(), "no output directory for an empty run");
    }

    #[tokio::test]
    async fn test_all_existing_means_nothing_to_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("new"))
            .expect(0)
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "old").unwrap();

        let pipeline = Pipeline::new(RunConfig {
            output_dir: temp.path().to_path_buf(),
            skip_existing: true,
            ..RunConfig::default()
        })
        .unwrap();
        let url = format!("{}/a.txt", server.uri());
        let report = pipeline.run(BTreeSet::from([url.clone()])).await.unwrap();

        assert_eq!(report.pre_skipped(), 1);
        assert!(matches!(
            report.outcome(&url),
            Some(UrlOutcome::SkippedExisting { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("a.txt")).unwrap(),
            "old"
        );
    }

    #[tokio::test]
    async fn test_output_dir_failure_is_setup_error() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let result = pipeline(blocker.join("out"))
            .run(BTreeSet::from([format!("{}/f", server.uri())]))
            .await;

        assert!(matches!(result, Err(PipelineError::OutputDir { .. })));
    }

    #[tokio::test]
    async fn test_producers_bound_concurrent_fetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("x")
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(RunConfig {
            output_dir: temp.path().to_path_buf(),
            preserve_path: true,
            producers: 1,
            consumers: 1,
            ..RunConfig::default()
        })
        .unwrap();
        let urls: BTreeSet<String> = (0..3)
            .map(|i| format!("{}/slow?n={i}", server.uri()))
            .collect();

        let started = std::time::Instant::now();
        let report = pipeline.run(urls).await.unwrap();

        // One fetch slot serializes the three delayed responses.
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert_eq!(report.total(), 3);
    }
}
