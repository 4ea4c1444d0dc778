//! google-search main entry point
//!
//! This is the command-line interface for the Google results spider.

use anyhow::Context as _;
use clap::Parser;
use google_search::config::{load_config_with_hash, Config};
use google_search::crawler::{build_http_client, CallbackRegistry, Engine};
use google_search::output::{build_sink, print_statistics};
use google_search::spider::{GoogleSpider, TerminalPrompt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// google-search: crawls Google results pages for a set of queries
///
/// Every results page becomes one JSON record. When Google answers with its
/// anti-bot challenge, the captcha image is saved to disk and the solution is
/// asked for on the terminal.
#[derive(Parser, Debug)]
#[command(name = "google-search")]
#[command(version)]
#[command(about = "Crawls Google results pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Search queries, one search each
    #[arg(value_name = "QUERY", required = true)]
    queries: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be searched without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, env_flag("CRAWL_DEBUG"));

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.queries);
        return Ok(());
    }

    handle_search(config, &cli.queries).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `debug` forces at least debug output for this crate.
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let verbose = if debug { verbose.max(1) } else { verbose };
    let filter = if quiet && !debug {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("google_search=info,warn"),
            1 => EnvFilter::new("google_search=debug,info"),
            2 => EnvFilter::new("google_search=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads a boolean environment variable (`1`, `t`, `true`, ...)
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "t" | "true"))
        .unwrap_or(false)
}

/// Handles the --dry-run mode: shows the configuration and the seed requests
fn handle_dry_run(config: &Config, queries: &[String]) {
    println!("=== google-search Dry Run ===\n");

    println!("Spider Configuration:");
    println!("  Engine: {}", config.spider.engine);
    println!("  Search URL: {}", config.spider.search_url);
    println!("  Challenge host: {}", config.spider.challenge_host);
    println!("  Result selector: {}", config.spider.result_selector);
    println!("  Next page delay: {}ms", config.spider.next_page_delay_ms);
    println!("  Captcha delay: {}ms", config.spider.captcha_delay_ms);
    println!("  Captcha directory: {}", config.spider.captcha_dir);
    match config.spider.max_pages {
        Some(max) => println!("  Max pages per query: {}", max),
        None => println!("  Max pages per query: unlimited"),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Results file: {}",
        config.output.results_path.as_deref().unwrap_or("(none)")
    );
    println!("  Pretty print: {}", config.output.pretty_print);

    println!("\nQueries ({}):", queries.len());
    for query in queries {
        println!("  - {}", query);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the search run
async fn handle_search(config: Config, queries: &[String]) -> anyhow::Result<()> {
    let output = build_sink(&config.output).context("failed to open results output")?;
    let client = build_http_client(&config.user_agent).context("failed to build HTTP client")?;

    let spider = Arc::new(GoogleSpider::new(
        config.spider.clone(),
        Arc::new(output),
        Arc::new(TerminalPrompt::new()),
    )?);
    let mut registry = CallbackRegistry::new();
    spider.register(&mut registry);

    let cancel = CancellationToken::new();
    let engine = Engine::new(client, registry, cancel.clone());
    for query in queries {
        tracing::info!("Searching for {:?}", query);
        engine.schedule(spider.search_request(query)?)?;
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, shutting down");
            cancel.cancel();
        }
    });

    match engine.run().await {
        Ok(stats) => {
            tracing::info!("Search completed successfully");
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            Err(e.into())
        }
    }
}
