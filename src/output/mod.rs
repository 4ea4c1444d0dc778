//! Output module
//!
//! This module handles:
//! - The `SearchResult` record and the `OutputSink` trait handlers emit through
//! - JSON-lines and stdout sinks, and chaining several sinks
//! - Crawl statistics

mod sinks;
pub mod stats;
mod traits;

pub use sinks::{JsonLinesSink, MemorySink, MultiSink, StdoutSink};
pub use stats::{print_statistics, CrawlStatistics, CrawlStats};
pub use traits::{OutputError, OutputResult, OutputSink, SearchResult};

use crate::config::OutputConfig;
use std::path::Path;

/// Builds the sink chain described by the output configuration
///
/// Stdout comes first when enabled, then the results file. The chain is never
/// empty: with stdout disabled and no results file, stdout is used anyway.
pub fn build_sink(config: &OutputConfig) -> OutputResult<MultiSink> {
    let mut sink = MultiSink::new();

    if config.pretty_print {
        sink.push(Box::new(StdoutSink));
    }

    if let Some(path) = &config.results_path {
        tracing::info!("Writing results to {}", path);
        sink.push(Box::new(JsonLinesSink::open(Path::new(path))?));
    }

    if sink.is_empty() {
        tracing::warn!("No results file and pretty-print disabled, printing results to stdout");
        sink.push(Box::new(StdoutSink));
    }

    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_sink_prints_results() {
        let sink = build_sink(&OutputConfig::default()).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_sink_never_empty() {
        let config = OutputConfig {
            results_path: None,
            pretty_print: false,
        };
        let sink = build_sink(&config).unwrap();
        assert!(!sink.is_empty());
    }

    #[test]
    fn test_build_sink_file_only() {
        let dir = tempdir().unwrap();
        let config = OutputConfig {
            results_path: Some(dir.path().join("out.jsonl").display().to_string()),
            pretty_print: false,
        };
        let sink = build_sink(&config).unwrap();
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_build_sink_with_file_and_stdout() {
        let dir = tempdir().unwrap();
        let config = OutputConfig {
            results_path: Some(dir.path().join("out.jsonl").display().to_string()),
            pretty_print: true,
        };
        let sink = build_sink(&config).unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_build_sink_unwritable_path() {
        let config = OutputConfig {
            results_path: Some("/nonexistent-dir/out.jsonl".to_string()),
            pretty_print: false,
        };
        assert!(build_sink(&config).is_err());
    }
}
