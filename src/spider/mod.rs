//! Google results spider
//!
//! Two handlers are registered with the engine:
//! - `google` handles results pages: extraction, emission and pagination, or
//!   the captcha episode when the page turns out to be a challenge
//! - `google-captcha` stores the challenge image for a waiting episode

pub mod captcha;
pub mod extract;
pub mod pagination;
pub mod prompt;

use crate::config::SpiderConfig;
use crate::crawler::{CallbackRegistry, Context, PendingRequest, Response};
use crate::output::{OutputSink, SearchResult};
use crate::url::classify_page;
use crate::{ConfigError, SpiderError};
use scraper::Selector;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub use captcha::{
    artifact_path, parse_challenge, CaptchaEpisodes, CaptchaSession, ChallengeForm, ChallengePage,
};
pub use extract::{extract_links, extract_result};
pub use pagination::{find_next_page, next_page_request, page_limit_reached};
pub use prompt::{Prompt, StaticPrompt, TerminalPrompt};

/// Callback for results pages
pub const GOOGLE: &str = "google";

/// Callback for challenge images
pub const GOOGLE_CAPTCHA: &str = "google-captcha";

/// Page handlers for one search engine
pub struct GoogleSpider {
    config: SpiderConfig,
    result_selector: Selector,
    output: Arc<dyn OutputSink>,
    prompt: Arc<dyn Prompt>,
    episodes: CaptchaEpisodes,
}

impl GoogleSpider {
    pub fn new(
        config: SpiderConfig,
        output: Arc<dyn OutputSink>,
        prompt: Arc<dyn Prompt>,
    ) -> Result<Self, SpiderError> {
        let result_selector = Selector::parse(&config.result_selector).map_err(|e| {
            ConfigError::Validation(format!(
                "invalid result-selector {:?}: {:?}",
                config.result_selector, e
            ))
        })?;

        Ok(Self {
            config,
            result_selector,
            output,
            prompt,
            episodes: CaptchaEpisodes::new(),
        })
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    /// Registers the spider's handlers under their callback names
    pub fn register(self: &Arc<Self>, registry: &mut CallbackRegistry) {
        let spider = Arc::clone(self);
        registry.register(GOOGLE, move |ctx: Context, response: Response| {
            let spider = Arc::clone(&spider);
            async move { spider.google(ctx, response).await }
        });

        let spider = Arc::clone(self);
        registry.register(GOOGLE_CAPTCHA, move |ctx: Context, response: Response| {
            let spider = Arc::clone(&spider);
            async move { spider.google_captcha(ctx, response).await }
        });
    }

    /// Builds the first request of a search
    pub fn search_request(&self, query: &str) -> Result<PendingRequest, SpiderError> {
        let mut url = Url::parse(&self.config.search_url)?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(PendingRequest::new(url, GOOGLE))
    }

    /// Handles a results page
    ///
    /// A challenge page starts a captcha episode instead; the resubmitted form
    /// comes back to this handler once solved.
    pub async fn google(&self, ctx: Context, response: Response) -> Result<(), SpiderError> {
        if classify_page(response.url(), &self.config.challenge_host).is_challenge() {
            return self.solve_captcha(&ctx, &response).await;
        }
        response.ensure_success()?;

        let (result, next_href) = {
            let document = response.html();
            let result = extract_result(
                response.url().as_str(),
                &document,
                &self.result_selector,
                &self.config.engine,
            );
            (result, find_next_page(&document))
        };
        tracing::debug!("Search: {}", result.source);

        self.output.output(&result)?;
        ctx.stats().record_page(result.results.len());

        self.continue_search(&ctx, response.url(), &result, next_href)
            .await
    }

    async fn continue_search(
        &self,
        ctx: &Context,
        current: &Url,
        result: &SearchResult,
        next_href: Option<String>,
    ) -> Result<(), SpiderError> {
        let Some(href) = next_href else {
            tracing::debug!("Search for {:?} is done", result.query);
            return Ok(());
        };

        if page_limit_reached(result.page, self.config.max_pages) {
            tracing::info!(
                "Search for {:?} stopped at page {} (max-pages)",
                result.query,
                result.page
            );
            return Ok(());
        }

        let request = next_page_request(current, &href)?;
        ctx.sleep(Duration::from_millis(self.config.next_page_delay_ms))
            .await?;
        ctx.schedule(request)?;
        ctx.stats().record_next_page();
        Ok(())
    }
}
