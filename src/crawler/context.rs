//! Per-crawl handles given to every handler invocation

use crate::crawler::request::PendingRequest;
use crate::output::CrawlStats;
use crate::SpiderError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Sending side of the engine's request queue
#[derive(Debug, Clone)]
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<PendingRequest>,
}

impl RequestQueue {
    /// Creates a queue and the receiver the engine drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PendingRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a request for fetching
    pub fn schedule(&self, request: PendingRequest) -> Result<(), SpiderError> {
        tracing::debug!("Scheduling {} -> {}", request.full_url(), request.callback);
        self.sender
            .send(request)
            .map_err(|_| SpiderError::QueueClosed)
    }
}

/// Everything a handler may touch besides its own spider
#[derive(Debug, Clone)]
pub struct Context {
    queue: RequestQueue,
    cancel: CancellationToken,
    stats: Arc<CrawlStats>,
}

impl Context {
    pub fn new(queue: RequestQueue, cancel: CancellationToken, stats: Arc<CrawlStats>) -> Self {
        Self {
            queue,
            cancel,
            stats,
        }
    }

    /// Schedules a follow-up request on the engine
    pub fn schedule(&self, request: PendingRequest) -> Result<(), SpiderError> {
        self.queue.schedule(request)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Suspends the calling branch for `duration`
    ///
    /// Only the current task sleeps; other branches keep running. Returns
    /// `Cancelled` if the crawl is shut down during the wait.
    pub async fn sleep(&self, duration: Duration) -> Result<(), SpiderError> {
        if duration.is_zero() {
            return if self.is_cancelled() {
                Err(SpiderError::Cancelled)
            } else {
                Ok(())
            };
        }

        tokio::select! {
            _ = self.cancel.cancelled() => Err(SpiderError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
