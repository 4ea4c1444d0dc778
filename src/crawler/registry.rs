//! Named handler table
//!
//! Requests name the handler that should process their response; the engine
//! resolves that name here at dispatch time. The registry is filled once at
//! startup and then frozen behind an `Arc`, so lookups never take a lock.

use crate::crawler::context::Context;
use crate::crawler::request::Response;
use crate::SpiderError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// A page handler
#[async_trait]
pub trait Handler: Send + Sync {
    /// Processes one fetched page
    async fn handle(&self, ctx: Context, response: Response) -> Result<(), SpiderError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Context, Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SpiderError>> + Send + 'static,
{
    async fn handle(&self, ctx: Context, response: Response) -> Result<(), SpiderError> {
        (self)(ctx, response).await
    }
}

/// Maps callback names to handlers
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `name`
    ///
    /// Registering a name twice replaces the earlier handler (last writer wins)
    /// and logs a warning.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        let name = name.into();
        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::warn!("Callback {:?} registered twice, keeping the latest handler", name);
        } else {
            tracing::debug!("Registered callback {:?}", name);
        }
    }

    /// Resolves a callback name
    pub fn get(&self, name: &str) -> Result<Arc<dyn Handler>, SpiderError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| SpiderError::UnknownCallback {
                name: name.to_string(),
            })
    }

    /// Runs the handler registered under `name`
    ///
    /// An unknown name is reported as `UnknownCallback`: the request that carried
    /// it can never be processed.
    pub async fn dispatch(
        &self,
        name: &str,
        ctx: Context,
        response: Response,
    ) -> Result<(), SpiderError> {
        let handler = self.get(name)?;
        handler.handle(ctx, response).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
