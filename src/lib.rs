//! Google search spider
//!
//! This crate implements the page handlers of a search-results crawler: result
//! extraction, pagination and the manual captcha interrupt/resume protocol, plus
//! a thin host engine that fetches pages and dispatches them to named callbacks.

pub mod config;
pub mod crawler;
pub mod output;
pub mod spider;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Captcha error: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("No handler registered for callback {name:?}")]
    UnknownCallback { name: String },

    #[error("Request queue is closed")]
    QueueClosed,

    #[error("Crawl cancelled")]
    Cancelled,
}

impl SpiderError {
    /// Returns true if the error must stop the whole crawl rather than a single branch
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownCallback { .. } | Self::QueueClosed)
    }
}

/// Captcha protocol errors
///
/// Every variant is fatal to the captcha branch it occurred on: a half-completed
/// episode cannot be resumed safely.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("Cannot find captcha image on {url}")]
    MissingImage { url: String },

    #[error("Cannot find captcha form on {url}")]
    MissingForm { url: String },

    #[error("Captcha response is missing its episode id")]
    MissingEpisode,

    #[error("Unknown captcha episode {episode}")]
    UnknownEpisode { episode: u64 },

    #[error("Failed to write captcha image to {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove captcha image {path}: {source}")]
    ArtifactRemove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Captcha image for episode {episode} was not captured: {reason}")]
    ImageNotCaptured { episode: u64, reason: String },

    #[error("Captcha prompt failed: {0}")]
    Prompt(String),

    #[error("Captcha prompt cancelled")]
    PromptCancelled,

    #[error("Invalid captcha transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CaptchaState,
        to: state::CaptchaState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for captcha operations
pub type CaptchaResult<T> = std::result::Result<T, CaptchaError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CallbackRegistry, Engine, PendingRequest, RequestQueue, Response};
pub use output::{OutputSink, SearchResult};
pub use spider::GoogleSpider;
pub use state::CaptchaState;
