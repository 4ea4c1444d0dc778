//! Next-page discovery
//!
//! The results page links its other pages through `/search?...&start=N`
//! anchors. The "Next" link is picked out by its visible text.

use crate::crawler::PendingRequest;
use crate::spider::GOOGLE;
use crate::url::{query_value, resolve_href};
use crate::SpiderError;
use scraper::{Html, Selector};
use url::Url;

/// Href prefix of the internal search path
pub const SEARCH_PATH: &str = "/search";

/// First letter of the localized "Next" label
pub const NEXT_MARKER: char = 'N';

/// Finds the href of the next results page
///
/// Candidates are anchors whose href starts with the search path and whose
/// text starts with the "Next" marker. The first candidate carrying a
/// non-empty `start` parameter wins.
pub fn find_next_page(document: &Html) -> Option<String> {
    let selector = Selector::parse(&format!(r#"a[href^="{}"]"#, SEARCH_PATH)).ok()?;

    document.select(&selector).find_map(|link| {
        let text: String = link.text().collect();
        if !text.trim_start().starts_with(NEXT_MARKER) {
            return None;
        }

        let href = link.value().attr("href")?;
        if query_value(href, "start").is_empty() {
            return None;
        }
        Some(href.to_string())
    })
}

/// Builds the request for the next results page
///
/// The href is resolved against the current page, which is also the referer.
pub fn next_page_request(current: &Url, href: &str) -> Result<PendingRequest, SpiderError> {
    let url = resolve_href(current, href)?;
    Ok(PendingRequest::new(url, GOOGLE).with_referer(current.as_str()))
}

/// Returns true if a ceiling is set and `page` has reached it
pub fn page_limit_reached(page: u32, max_pages: Option<u32>) -> bool {
    matches!(max_pages, Some(max) if page >= max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(html: &str) -> Option<String> {
        find_next_page(&Html::parse_document(html))
    }

    #[test]
    fn test_next_link_found() {
        let html = r#"
            <a href="/search?q=cats&amp;start=10">2</a>
            <a href="/search?q=cats&amp;start=10"><span>Next</span></a>
        "#;
        assert_eq!(next(html), Some("/search?q=cats&start=10".to_string()));
    }

    #[test]
    fn test_localized_marker() {
        // German "Nächste"
        let html = r#"<a href="/search?q=katzen&amp;start=10">Nächste</a>"#;
        assert_eq!(next(html), Some("/search?q=katzen&start=10".to_string()));
    }

    #[test]
    fn test_first_qualifying_anchor_wins() {
        let html = r#"
            <a href="/search?q=cats&amp;tbm=nws">News</a>
            <a href="/search?q=cats&amp;start=10">Next</a>
            <a href="/search?q=cats&amp;start=20">Next</a>
        "#;
        assert_eq!(next(html), Some("/search?q=cats&start=10".to_string()));
    }

    #[test]
    fn test_marker_without_start_is_ignored() {
        let html = r#"<a href="/search?q=cats&amp;tbm=nws">News</a>"#;
        assert_eq!(next(html), None);
    }

    #[test]
    fn test_empty_start_is_ignored() {
        let html = r#"<a href="/search?q=cats&amp;start=">Next</a>"#;
        assert_eq!(next(html), None);
    }

    #[test]
    fn test_other_paths_are_ignored() {
        let html = r#"<a href="https://www.google.com/search?q=cats&amp;start=10">Next</a>"#;
        assert_eq!(next(html), None);
    }

    #[test]
    fn test_wrong_text_is_ignored() {
        let html = r#"<a href="/search?q=cats&amp;start=0">Previous</a>"#;
        assert_eq!(next(html), None);
    }

    #[test]
    fn test_no_anchors() {
        assert_eq!(next("<html><body><p>last page</p></body></html>"), None);
    }

    #[test]
    fn test_next_page_request() {
        let current = Url::parse("https://www.google.com/search?q=cats").unwrap();
        let request = next_page_request(&current, "/search?q=cats&start=10").unwrap();

        assert_eq!(request.url.as_str(), "https://www.google.com/search?q=cats&start=10");
        assert_eq!(request.referer.as_deref(), Some(current.as_str()));
        assert_eq!(request.callback, GOOGLE);
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_page_limit() {
        assert!(!page_limit_reached(50, None));
        assert!(!page_limit_reached(2, Some(3)));
        assert!(page_limit_reached(3, Some(3)));
    }
}
