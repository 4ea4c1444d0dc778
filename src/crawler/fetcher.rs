//! HTTP fetcher
//!
//! This module handles all HTTP requests for the engine:
//! - Building the HTTP client with the configured user agent and a cookie store
//! - Fetching a pending request (query parameters and referer included)
//! - Classifying transport errors
//!
//! Any HTTP status is handed to the handler; deciding whether a 4xx/5xx page is
//! an error belongs to the handler (the challenge page itself arrives as a 429).

use crate::config::UserAgentConfig;
use crate::crawler::request::{PendingRequest, Response};
use crate::SpiderError;
use reqwest::{header, redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// Cookies are kept across requests: the challenge flow only unblocks the
/// session that solved it.
///
/// # Example
///
/// ```no_run
/// use google_search::config::UserAgentConfig;
/// use google_search::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SearchBot".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: None,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a pending request
///
/// # Returns
///
/// * `Ok(Response)` - The page, whatever its status, with the final URL after redirects
/// * `Err(SpiderError::Http)` - Transport failure (timeout, connection refused, too many redirects)
pub async fn fetch(client: &Client, request: &PendingRequest) -> Result<Response, SpiderError> {
    let url = request.full_url();
    tracing::debug!("Fetching {}", url);

    let mut builder = client.get(url.clone());
    if let Some(referer) = &request.referer {
        builder = builder.header(header::REFERER, referer.as_str());
    }

    let response = builder.send().await.map_err(|source| {
        if source.is_timeout() {
            tracing::warn!("Request timeout for {}", url);
        } else if source.is_connect() {
            tracing::warn!("Connection failed for {}", url);
        } else if source.is_redirect() {
            tracing::warn!("Too many redirects from {}", url);
        }
        SpiderError::Http {
            url: url.to_string(),
            source,
        }
    })?;

    let status = response.status().as_u16();
    let final_url = response.url().clone();
    if final_url != url {
        tracing::debug!("{} redirected to {}", url, final_url);
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| SpiderError::Http {
            url: final_url.to_string(),
            source,
        })?
        .to_vec();

    Ok(Response::new(request.clone(), final_url, status, body))
}
