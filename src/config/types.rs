use serde::Deserialize;

/// Main configuration structure for the spider
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spider: SpiderConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Search and captcha handling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SpiderConfig {
    /// Engine name stamped on every result
    pub engine: String,

    /// Search endpoint used to seed queries
    pub search_url: String,

    /// Host (or `*.` pattern) that serves the anti-bot challenge
    pub challenge_host: String,

    /// CSS selector of the results-heading anchors
    pub result_selector: String,

    /// Delay before scheduling the next results page (milliseconds)
    pub next_page_delay_ms: u64,

    /// Delay between capturing the challenge image and prompting (milliseconds)
    pub captcha_delay_ms: u64,

    /// How long to wait for the challenge image to arrive (milliseconds)
    pub captcha_image_timeout_ms: u64,

    /// Directory that receives captcha images
    pub captcha_dir: String,

    /// Optional ceiling on results pages per query
    pub max_pages: Option<u32>,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            engine: "google".to_string(),
            search_url: "https://www.google.com/search".to_string(),
            challenge_host: "ipv4.google.com".to_string(),
            result_selector: "h3.r a".to_string(),
            next_page_delay_ms: 5000,
            captcha_delay_ms: 1000,
            captcha_image_timeout_ms: 30_000,
            captcha_dir: ".".to_string(),
            max_pages: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// `Name/Version` or `Name/Version (+ContactURL)` when a contact URL is set.
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// JSON-lines file that receives every result
    pub results_path: Option<String>,

    /// Pretty-print every result to stdout
    pub pretty_print: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: None,
            pretty_print: true,
        }
    }
}
