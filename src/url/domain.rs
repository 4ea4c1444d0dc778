use crate::UrlError;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use google_search::url::extract_host;
///
/// let url = Url::parse("https://IPV4.Google.com/sorry/index").unwrap();
/// assert_eq!(extract_host(&url), Some("ipv4.google.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Resolves an href found on a page against the page URL
///
/// Search pages link with root-relative hrefs (`/search?...`, `/sorry/image?...`),
/// which only become fetchable once joined with the page they came from.
///
/// # Arguments
///
/// * `base` - The URL of the page the href was found on
/// * `href` - The raw attribute value
///
/// # Returns
///
/// * `Ok(Url)` - Absolute HTTP(S) URL
/// * `Err(UrlError)` - Empty, unparsable or non-HTTP(S) href
pub fn resolve_href(base: &Url, href: &str) -> Result<Url, UrlError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    let resolved = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}
