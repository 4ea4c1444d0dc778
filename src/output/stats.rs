//! Crawl statistics
//!
//! Counters are shared by every branch of a crawl and only ever incremented,
//! so they are plain atomics rather than a locked struct.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated while a crawl runs
#[derive(Debug, Default)]
pub struct CrawlStats {
    requests_fetched: AtomicU64,
    pages_parsed: AtomicU64,
    result_urls: AtomicU64,
    pages_scheduled: AtomicU64,
    captcha_episodes: AtomicU64,
    captchas_resolved: AtomicU64,
    branches_failed: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch(&self) {
        self.requests_fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one emitted results page carrying `urls` result URLs
    pub fn record_page(&self, urls: usize) {
        self.pages_parsed.fetch_add(1, Ordering::Relaxed);
        self.result_urls.fetch_add(urls as u64, Ordering::Relaxed);
    }

    pub fn record_next_page(&self) {
        self.pages_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_captcha(&self) {
        self.captcha_episodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_captcha_resolved(&self) {
        self.captchas_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_branch(&self) {
        self.branches_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a consistent-enough copy of the counters for reporting
    pub fn snapshot(&self) -> CrawlStatistics {
        CrawlStatistics {
            requests_fetched: self.requests_fetched.load(Ordering::Relaxed),
            pages_parsed: self.pages_parsed.load(Ordering::Relaxed),
            result_urls: self.result_urls.load(Ordering::Relaxed),
            pages_scheduled: self.pages_scheduled.load(Ordering::Relaxed),
            captcha_episodes: self.captcha_episodes.load(Ordering::Relaxed),
            captchas_resolved: self.captchas_resolved.load(Ordering::Relaxed),
            branches_failed: self.branches_failed.load(Ordering::Relaxed),
        }
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Requests fetched by the engine
    pub requests_fetched: u64,

    /// Results pages parsed and emitted
    pub pages_parsed: u64,

    /// Result URLs across all emitted pages
    pub result_urls: u64,

    /// Next-page requests scheduled
    pub pages_scheduled: u64,

    /// Challenge pages encountered
    pub captcha_episodes: u64,

    /// Challenges answered and resubmitted
    pub captchas_resolved: u64,

    /// Branches that ended with an error
    pub branches_failed: u64,
}

impl CrawlStatistics {
    /// Returns the average number of result URLs per parsed page
    pub fn results_per_page(&self) -> f64 {
        if self.pages_parsed == 0 {
            return 0.0;
        }
        self.result_urls as f64 / self.pages_parsed as f64
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Requests fetched: {}", stats.requests_fetched);
    println!("  Pages parsed: {}", stats.pages_parsed);
    println!(
        "  Result URLs: {} ({:.1} per page)",
        stats.result_urls,
        stats.results_per_page()
    );
    println!("  Next pages scheduled: {}", stats.pages_scheduled);
    println!();

    if stats.captcha_episodes > 0 {
        println!("Captcha:");
        println!("  Challenges: {}", stats.captcha_episodes);
        println!("  Resolved: {}", stats.captchas_resolved);
        println!();
    }

    if stats.branches_failed > 0 {
        println!("Failed branches: {}", stats.branches_failed);
    }
}
