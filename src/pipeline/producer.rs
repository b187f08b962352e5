//! Fetch workers: one task per URL, retrying with exponential backoff.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::report::{RunReport, UrlOutcome};
use crate::download::{DownloadError, HttpClient, RetryDecision, RetryPolicy};
use crate::queue::{FetchResult, QueueMessage, WorkQueue};

/// Attempts made for one URL and the backoff delays slept between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FetchTrace {
    pub(crate) attempts: u32,
    pub(crate) backoffs: Vec<Duration>,
}

/// State shared by every producer task in a run.
#[derive(Debug)]
pub(crate) struct ProducerContext {
    pub(crate) client: HttpClient,
    pub(crate) policy: RetryPolicy,
    pub(crate) queue: WorkQueue,
    pub(crate) report: Arc<RunReport>,
    pub(crate) fetch_slots: Arc<Semaphore>,
}

/// Fetches `url`, retrying failed attempts per `policy`.
///
/// Every failure kind (transport, timeout, non-success status) is retried
/// until the attempt budget is spent.
#[instrument(level = "debug", skip(client, policy), fields(url = %url))]
pub(crate) async fn fetch_with_retry(
    client: &HttpClient,
    url: &str,
    policy: &RetryPolicy,
) -> (Result<Vec<u8>, DownloadError>, FetchTrace) {
    let mut trace = FetchTrace::default();

    loop {
        trace.attempts += 1;
        debug!(attempt = trace.attempts, "attempting fetch");

        let error = match client.fetch(url).await {
            Ok(body) => return (Ok(body), trace),
            Err(e) => e,
        };

        match policy.should_retry(trace.attempts) {
            RetryDecision::Retry {
                delay,
                attempt: next_attempt,
            } => {
                warn!(
                    url = %url,
                    attempt = next_attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "retrying fetch"
                );
                tokio::time::sleep(delay).await;
                trace.backoffs.push(delay);
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(url = %url, %reason, "not retrying fetch");
                return (Err(error), trace);
            }
        }
    }
}

/// Fetches one URL and enqueues the payload for persisting.
///
/// A URL whose attempts are exhausted is recorded as failed and never
/// enqueued.
pub(crate) async fn run_producer(url: String, destination: PathBuf, ctx: Arc<ProducerContext>) {
    let Ok(_slot) = ctx.fetch_slots.acquire().await else {
        warn!(url = %url, "fetch slots closed, URL dropped");
        ctx.report.record(
            &url,
            UrlOutcome::FetchFailed {
                attempts: 0,
                error: "fetch slots closed".to_string(),
            },
        );
        return;
    };

    info!(url = %url, "fetching");
    let (result, trace) = fetch_with_retry(&ctx.client, &url, &ctx.policy).await;
    for _ in &trace.backoffs {
        ctx.report.record_retry();
    }

    match result {
        Ok(body) => {
            info!(url = %url, bytes = body.len(), attempts = trace.attempts, "fetched");
            let message = QueueMessage::Fetched(FetchResult::new(&url, body, &destination));
            if let Err(e) = ctx.queue.put(message) {
                warn!(url = %url, error = %e, "fetched result dropped");
                ctx.report.record(
                    &url,
                    UrlOutcome::PersistFailed {
                        path: destination,
                        error: e.to_string(),
                    },
                );
            }
        }
        Err(e) => {
            warn!(
                url = %url,
                attempts = trace.attempts,
                error = %e,
                "fetch failed after all attempts"
            );
            ctx.report.record(
                &url,
                UrlOutcome::FetchFailed {
                    attempts: trace.attempts,
                    error: e.to_string(),
                },
            );
        }
    }
}
