//! Crawl engine - drains the request queue and dispatches fetched pages
//!
//! Every queued request becomes its own branch task: fetch, then run the
//! handler named by the request's callback. Handlers schedule follow-up requests
//! through their `Context`, which land back on the same queue. The crawl ends
//! when nothing is queued and no branch is in flight, or when the cancellation
//! token fires.

use crate::crawler::context::{Context, RequestQueue};
use crate::crawler::fetcher::fetch;
use crate::crawler::registry::CallbackRegistry;
use crate::crawler::request::PendingRequest;
use crate::output::{CrawlStatistics, CrawlStats};
use crate::SpiderError;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Main engine structure
pub struct Engine {
    client: Client,
    registry: Arc<CallbackRegistry>,
    queue: RequestQueue,
    receiver: mpsc::UnboundedReceiver<PendingRequest>,
    cancel: CancellationToken,
    stats: Arc<CrawlStats>,
}

impl Engine {
    /// Creates a new engine
    ///
    /// The registry is frozen from here on; register every handler first.
    pub fn new(client: Client, registry: CallbackRegistry, cancel: CancellationToken) -> Self {
        let (queue, receiver) = RequestQueue::channel();
        tracing::debug!("Engine callbacks: {:?}", registry.names());

        Self {
            client,
            registry: Arc::new(registry),
            queue,
            receiver,
            cancel,
            stats: Arc::new(CrawlStats::new()),
        }
    }

    /// Handle for seeding the queue
    pub fn queue(&self) -> RequestQueue {
        self.queue.clone()
    }

    pub fn stats(&self) -> Arc<CrawlStats> {
        self.stats.clone()
    }

    /// Queues a starting request
    pub fn schedule(&self, request: PendingRequest) -> Result<(), SpiderError> {
        self.queue.schedule(request)
    }

    /// Runs until the queue is drained
    ///
    /// Branch errors are logged and counted; the branch is simply dropped. An
    /// unresolvable callback stops the whole crawl and is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Crawl finished, counters at the end of the run
    /// * `Err(SpiderError::Cancelled)` - The cancellation token fired
    /// * `Err(SpiderError::UnknownCallback)` - A request named an unregistered handler
    pub async fn run(self) -> Result<CrawlStatistics, SpiderError> {
        let Engine {
            client,
            registry,
            queue,
            mut receiver,
            cancel,
            stats,
        } = self;

        let context = Context::new(queue, cancel.clone(), stats.clone());
        let mut branches: JoinSet<Result<(), SpiderError>> = JoinSet::new();

        tracing::info!("Starting crawl");

        loop {
            if branches.is_empty() {
                match receiver.try_recv() {
                    Ok(request) => {
                        spawn_branch(&mut branches, &client, &registry, &context, request);
                        continue;
                    }
                    Err(_) => {
                        tracing::info!("Queue is empty, crawl complete");
                        break;
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::warn!("Crawl cancelled, stopping {} branches", branches.len());
                    branches.shutdown().await;
                    return Err(SpiderError::Cancelled);
                }
                Some(request) = receiver.recv() => {
                    spawn_branch(&mut branches, &client, &registry, &context, request);
                }
                Some(joined) = branches.join_next() => match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) if e.is_fatal() => {
                        tracing::error!("Fatal error, stopping crawl: {}", e);
                        cancel.cancel();
                        branches.shutdown().await;
                        return Err(e);
                    }
                    Ok(Err(SpiderError::Cancelled)) => {
                        tracing::debug!("Branch stopped by cancellation");
                    }
                    Ok(Err(e)) => {
                        tracing::error!("Branch failed: {}", e);
                        stats.record_failed_branch();
                    }
                    Err(e) => {
                        tracing::error!("Branch task failed: {}", e);
                        stats.record_failed_branch();
                    }
                },
            }
        }

        let snapshot = stats.snapshot();
        tracing::info!(
            "Crawl finished: {} requests, {} pages, {} result URLs",
            snapshot.requests_fetched,
            snapshot.pages_parsed,
            snapshot.result_urls
        );
        Ok(snapshot)
    }
}

/// Spawns one branch: resolve the callback, fetch, dispatch
fn spawn_branch(
    branches: &mut JoinSet<Result<(), SpiderError>>,
    client: &Client,
    registry: &Arc<CallbackRegistry>,
    context: &Context,
    request: PendingRequest,
) {
    let client = client.clone();
    let registry = registry.clone();
    let ctx = context.clone();

    branches.spawn(async move {
        // Resolve before fetching so a bad name never costs a request
        let handler = registry.get(&request.callback)?;
        let response = fetch(&client, &request).await?;
        ctx.stats().record_fetch();
        tracing::debug!(
            "Dispatching {} ({}) to {}",
            response.url(),
            response.status(),
            request.callback
        );
        handler.handle(ctx, response).await
    });
}
