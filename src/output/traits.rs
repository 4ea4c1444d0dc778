//! Output sink trait and the result record it carries

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while delivering a result
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One parsed results page
///
/// Built once per successfully parsed page and emitted exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Search query
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,

    /// 1-based results page
    pub page: u32,

    /// Result URLs in page order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<String>,

    /// Result engine, "google"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub engine: String,

    /// URL the page was fetched from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

/// Trait for result sinks
///
/// `output` is called once per parsed page. An error aborts the branch that
/// produced the result; sinks that want retries must do them internally.
/// Implementations must be thread-safe.
pub trait OutputSink: Send + Sync {
    /// Delivers a single result
    fn output(&self, result: &SearchResult) -> OutputResult<()>;
}
