//! Requests handed to the engine and the responses it dispatches

use crate::SpiderError;
use scraper::Html;
use std::collections::BTreeMap;
use url::Url;

/// A unit of future work: fetch `url`, then run the handler named by `callback`
///
/// Requests carry the handler's name rather than the handler itself, so the
/// queue never holds a live reference into the spider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// URL to fetch
    pub url: Url,

    /// Page that led to this request
    pub referer: Option<String>,

    /// Extra query parameters appended to `url` when fetching
    pub query: Vec<(String, String)>,

    /// Name of the handler that processes the response
    pub callback: String,

    /// Per-request values handed through to the response
    pub meta: BTreeMap<String, String>,
}

impl PendingRequest {
    pub fn new(url: Url, callback: impl Into<String>) -> Self {
        Self {
            url,
            referer: None,
            query: Vec::new(),
            callback: callback.into(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// The URL actually fetched: `url` with `query` appended
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url
    }
}

/// A fetched page, together with the request that produced it
#[derive(Debug, Clone)]
pub struct Response {
    request: PendingRequest,
    url: Url,
    status: u16,
    body: Vec<u8>,
}

impl Response {
    pub fn new(request: PendingRequest, url: Url, status: u16, body: Vec<u8>) -> Self {
        Self {
            request,
            url,
            status,
            body,
        }
    }

    /// Final URL after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn request(&self) -> &PendingRequest {
        &self.request
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as an HTML document
    ///
    /// `Html` is not `Send`; keep it out of scope across `.await` points.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.text())
    }

    /// Looks up a metadata value set on the originating request
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.request.meta.get(key).map(String::as_str)
    }

    /// Fails with `HttpStatus` unless the status is 2xx
    pub fn ensure_success(&self) -> Result<(), SpiderError> {
        if (200..300).contains(&self.status) {
            Ok(())
        } else {
            Err(SpiderError::HttpStatus {
                url: self.url.to_string(),
                status: self.status,
            })
        }
    }
}
