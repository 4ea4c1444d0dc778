//! URL handling module
//!
//! This module provides query-string lookups, page-number derivation, href
//! resolution, host matching and page classification.

mod domain;
mod matcher;
mod query;

use ::url::Url;

// Re-export main functions
pub use domain::{extract_host, resolve_href};
pub use matcher::matches_host;
pub use query::{page_from_url, query_value};

/// What a fetched page is, judged by where it was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// Ordinary search results page
    Results,
    /// Anti-bot challenge page
    Challenge,
}

impl PageKind {
    /// Returns true if the page is an anti-bot challenge
    pub fn is_challenge(&self) -> bool {
        matches!(self, Self::Challenge)
    }
}

/// Classifies a fetched page by its final URL
///
/// A page whose host matches `challenge_host` (exact or `*.` wildcard pattern)
/// is a challenge; everything else is treated as a results page.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use google_search::url::{classify_page, PageKind};
///
/// let sorry = Url::parse("https://ipv4.google.com/sorry/index").unwrap();
/// assert_eq!(classify_page(&sorry, "ipv4.google.com"), PageKind::Challenge);
///
/// let serp = Url::parse("https://www.google.com/search?q=cats").unwrap();
/// assert_eq!(classify_page(&serp, "ipv4.google.com"), PageKind::Results);
/// ```
pub fn classify_page(url: &Url, challenge_host: &str) -> PageKind {
    match extract_host(url) {
        Some(host) if matches_host(challenge_host, &host) => PageKind::Challenge,
        _ => PageKind::Results,
    }
}
