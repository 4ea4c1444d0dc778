use url::form_urlencoded;

/// Returns the first value of `key` in the query string of `uri`
///
/// Works on absolute URLs as well as on bare hrefs such as `/url?q=...`: everything
/// after the first `?` (up to an optional `#`) is parsed as a query string. A URI
/// without `?` is parsed whole. Missing keys yield an empty string.
///
/// # Examples
///
/// ```
/// use google_search::url::query_value;
///
/// assert_eq!(query_value("/url?q=http://example.com&sa=U", "q"), "http://example.com");
/// assert_eq!(query_value("https://www.google.com/search?q=cats", "start"), "");
/// ```
pub fn query_value(uri: &str, key: &str) -> String {
    let query = match uri.find('?') {
        Some(index) => &uri[index + 1..],
        None => uri,
    };
    let query = query.split('#').next().unwrap_or_default();

    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

/// Derives the 1-based results page number from the `start` offset of `uri`
///
/// Results pages hold ten entries, so `start=20` is page 3. A missing or
/// non-numeric `start` is page 1.
pub fn page_from_url(uri: &str) -> u32 {
    query_value(uri, "start")
        .parse::<u32>()
        .map(|start| start / 10 + 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_value_absolute_url() {
        let uri = "https://www.google.com/search?q=cats&start=20";
        assert_eq!(query_value(uri, "q"), "cats");
        assert_eq!(query_value(uri, "start"), "20");
    }

    #[test]
    fn test_query_value_decodes() {
        let uri = "https://www.google.com/search?q=rust+lang%21";
        assert_eq!(query_value(uri, "q"), "rust lang!");
    }

    #[test]
    fn test_query_value_redirect_href() {
        let href = "/url?q=http://example.com/a%3Fb%3D1&sa=U&ved=0";
        assert_eq!(query_value(href, "q"), "http://example.com/a?b=1");
    }

    #[test]
    fn test_query_value_first_wins() {
        assert_eq!(query_value("/search?q=a&q=b", "q"), "a");
    }

    #[test]
    fn test_query_value_missing_key() {
        assert_eq!(query_value("/search?q=cats", "start"), "");
        assert_eq!(query_value("", "q"), "");
    }

    #[test]
    fn test_query_value_ignores_fragment() {
        assert_eq!(query_value("/search?q=cats#top", "q"), "cats");
    }

    #[test]
    fn test_page_from_start() {
        assert_eq!(page_from_url("https://www.google.com/search?q=cats&start=20"), 3);
        assert_eq!(page_from_url("https://www.google.com/search?q=cats&start=0"), 1);
        assert_eq!(page_from_url("https://www.google.com/search?q=cats&start=19"), 2);
    }

    #[test]
    fn test_page_without_start() {
        assert_eq!(page_from_url("https://www.google.com/search?q=cats"), 1);
    }

    #[test]
    fn test_page_with_non_numeric_start() {
        assert_eq!(page_from_url("https://www.google.com/search?q=cats&start=abc"), 1);
        assert_eq!(page_from_url("https://www.google.com/search?q=cats&start=-10"), 1);
    }
}
