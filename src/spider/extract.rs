//! Results page extraction
//!
//! Turns a results page into a `SearchResult`:
//! - `query` and `page` come from the page URL (`q` and `start`)
//! - `results` are the hrefs of the results-heading anchors, in document order

use crate::output::SearchResult;
use crate::url::{page_from_url, query_value};
use scraper::{Html, Selector};

/// Href prefix of the engine's click-tracking redirect (`/url?q=<target>`)
pub const REDIRECT_PREFIX: &str = "/url";

/// Builds the result record for one results page
///
/// # Arguments
///
/// * `source` - URL the page was fetched from
/// * `document` - The parsed page
/// * `selector` - Selector matching the results-heading anchors
/// * `engine` - Engine name stamped on the record
///
/// # Example
///
/// ```
/// use google_search::spider::extract_result;
/// use scraper::{Html, Selector};
///
/// let html = r#"<h3 class="r"><a href="/url?q=http://example.com">Example</a></h3>"#;
/// let document = Html::parse_document(html);
/// let selector = Selector::parse("h3.r a").unwrap();
///
/// let result = extract_result(
///     "https://www.google.com/search?q=cats&start=20",
///     &document,
///     &selector,
///     "google",
/// );
/// assert_eq!(result.query, "cats");
/// assert_eq!(result.page, 3);
/// assert_eq!(result.results, vec!["http://example.com".to_string()]);
/// ```
pub fn extract_result(
    source: &str,
    document: &Html,
    selector: &Selector,
    engine: &str,
) -> SearchResult {
    SearchResult {
        query: query_value(source, "q"),
        page: page_from_url(source),
        results: extract_links(document, selector),
        engine: engine.to_string(),
        source: source.to_string(),
    }
}

/// Collects result URLs from the anchors matching `selector`, in document order
pub fn extract_links(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(result_link)
        .collect()
}

/// Maps a result anchor href to the URL it points at
///
/// Returns None if the href should be skipped:
/// - root-relative links that are not the redirect (internal engine pages)
/// - empty hrefs, or redirects without a `q` target
fn result_link(href: &str) -> Option<String> {
    if href.starts_with(REDIRECT_PREFIX) {
        let target = query_value(href, "q");
        if target.is_empty() {
            tracing::debug!("Redirect without target: {}", href);
            return None;
        }
        return Some(target);
    }

    if href.is_empty() || href.starts_with('/') {
        return None;
    }

    Some(href.to_string())
}
