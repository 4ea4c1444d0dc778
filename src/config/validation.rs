use crate::config::types::{Config, OutputConfig, SpiderConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound for the configurable delays (ten minutes)
const MAX_DELAY_MS: u64 = 600_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_spider_config(&config.spider)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates search and captcha settings
fn validate_spider_config(config: &SpiderConfig) -> Result<(), ConfigError> {
    if config.engine.trim().is_empty() {
        return Err(ConfigError::Validation("engine cannot be empty".to_string()));
    }

    let search_url = Url::parse(&config.search_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search-url: {}", e)))?;
    if search_url.scheme() != "http" && search_url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "search-url must use HTTP or HTTPS, got '{}'",
            config.search_url
        )));
    }

    validate_host_pattern(&config.challenge_host)?;

    if Selector::parse(&config.result_selector).is_err() {
        return Err(ConfigError::Validation(format!(
            "result-selector is not a valid CSS selector: '{}'",
            config.result_selector
        )));
    }

    for (name, value) in [
        ("next-page-delay-ms", config.next_page_delay_ms),
        ("captcha-delay-ms", config.captcha_delay_ms),
        ("captcha-image-timeout-ms", config.captcha_image_timeout_ms),
    ] {
        if value > MAX_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "{} must be <= {}ms, got {}ms",
                name, MAX_DELAY_MS, value
            )));
        }
    }

    if config.captcha_image_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "captcha-image-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.captcha_dir.is_empty() {
        return Err(ConfigError::Validation(
            "captcha-dir cannot be empty".to_string(),
        ));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if matches!(config.results_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "results-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates a host pattern (supports a leading `*.` wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Host pattern '{}' has no host after the wildcard",
            pattern
        )));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_agent() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "SearchBot".to_string(),
            crawler_version: "0.1".to_string(),
            contact_url: None,
        }
    }

    fn config() -> Config {
        Config {
            spider: SpiderConfig::default(),
            user_agent: user_agent(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&config()).is_ok());
    }

    #[test]
    fn test_validate_host_pattern() {
        assert!(validate_host_pattern("ipv4.google.com").is_ok());
        assert!(validate_host_pattern("*.google.com").is_ok());
        assert!(validate_host_pattern("localhost").is_ok());

        assert!(validate_host_pattern("").is_err());
        assert!(validate_host_pattern("*.").is_err());
        assert!(validate_host_pattern(".google.com").is_err());
        assert!(validate_host_pattern("google..com").is_err());
        assert!(validate_host_pattern("google.com/sorry").is_err());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = config();
        config.spider.result_selector = "h3..r >>".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_non_http_search_url_rejected() {
        let mut config = config();
        config.spider.search_url = "ftp://www.google.com/search".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_delay_bounds() {
        let mut config = config();
        config.spider.next_page_delay_ms = 0;
        assert!(validate(&config).is_ok());

        config.spider.next_page_delay_ms = MAX_DELAY_MS + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_image_timeout_rejected() {
        let mut config = config();
        config.spider.captcha_image_timeout_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = config();
        config.spider.max_pages = Some(0);
        assert!(validate(&config).is_err());

        config.spider.max_pages = Some(1);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = config();
        config.user_agent.crawler_name = "Search Bot".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_contact_url() {
        let mut config = config();
        config.user_agent.contact_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_results_path_rejected() {
        let mut config = config();
        config.output.results_path = Some(String::new());
        assert!(validate(&config).is_err());
    }
}
