/// Checks if a host matches a host pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact match: "ipv4.google.com" matches only "ipv4.google.com"
/// 2. Wildcard match: "*.google.com" matches "google.com" and any subdomain of it
///
/// The comparison ignores ASCII case on both sides.
///
/// # Examples
///
/// ```
/// use google_search::url::matches_host;
///
/// assert!(matches_host("ipv4.google.com", "ipv4.google.com"));
/// assert!(!matches_host("ipv4.google.com", "www.google.com"));
///
/// assert!(matches_host("*.google.com", "ipv6.google.com"));
/// assert!(!matches_host("*.google.com", "google.com.evil.org"));
/// ```
pub fn matches_host(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        host == pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_host("ipv4.google.com", "ipv4.google.com"));
        assert!(!matches_host("ipv4.google.com", "ipv6.google.com"));
    }

    #[test]
    fn test_exact_ignores_case() {
        assert!(matches_host("ipv4.google.com", "IPv4.Google.com"));
        assert!(matches_host("IPV4.GOOGLE.COM", "ipv4.google.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_subdomains() {
        assert!(matches_host("*.sorry.example", "sorry.example"));
        assert!(matches_host("*.sorry.example", "a.sorry.example"));
        assert!(matches_host("*.sorry.example", "a.b.sorry.example"));
    }

    #[test]
    fn test_wildcard_no_partial_label_match() {
        assert!(!matches_host("*.google.com", "notgoogle.com"));
        assert!(!matches_host("*.google.com", "google.com.org"));
    }

    #[test]
    fn test_empty_host() {
        assert!(!matches_host("ipv4.google.com", ""));
        assert!(!matches_host("*.google.com", ""));
    }
}
