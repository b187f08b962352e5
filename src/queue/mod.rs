//! Work queue connecting fetch producers to persist consumers.
//!
//! The queue is an unbounded FIFO channel shared by many producers and many
//! consumers. Besides carrying messages it counts outstanding work: every
//! [`put`](WorkQueue::put) increments the count and every
//! [`task_done`](WorkQueue::task_done) decrements it, so
//! [`join`](WorkQueue::join) can wait until every enqueued message (including
//! shutdown sentinels) has been acknowledged.
//!
//! # Example
//!
//! ```
//! use bulkfetch_core::queue::{FetchResult, QueueMessage, WorkQueue};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = WorkQueue::new();
//! queue.put(QueueMessage::Fetched(FetchResult::new("http://h/a", b"x".to_vec(), "out/a")))?;
//!
//! let consumer = queue.clone();
//! tokio::spawn(async move {
//!     while let Some(QueueMessage::Fetched(result)) = consumer.get().await {
//!         println!("persist {}", result.url);
//!         consumer.task_done();
//!     }
//! });
//!
//! queue.join().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod item;

pub use error::QueueError;
pub use item::{FetchResult, QueueMessage};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{trace, warn};

/// Multi-producer, multi-consumer FIFO queue with a drain signal.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    sender: mpsc::UnboundedSender<QueueMessage>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<QueueMessage>>>,
    outstanding: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            outstanding: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// Enqueues a message without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the receiving side has been dropped.
    pub fn put(&self, message: QueueMessage) -> Result<(), QueueError> {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(message).is_err() {
            self.release_one();
            return Err(QueueError::Closed);
        }
        trace!(outstanding = self.pending(), "message enqueued");
        Ok(())
    }

    /// Dequeues the next message, waiting while the queue is empty.
    ///
    /// Returns `None` only if every sender is gone, which cannot happen while
    /// this handle is alive; callers treat it like [`QueueMessage::Shutdown`].
    pub async fn get(&self) -> Option<QueueMessage> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }

    /// Acknowledges one previously dequeued message.
    pub fn task_done(&self) {
        self.release_one();
    }

    /// Number of messages enqueued but not yet acknowledged.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Waits until every enqueued message has been acknowledged.
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent final `task_done` is not missed.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release_one(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => warn!("task_done called more times than messages were enqueued"),
        }
    }
}
