//! Trawl main entry point
//!
//! This is the command-line interface for triggering crawls and searches.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trawl::config::{load_config, Config};
use trawl::frontier::{load_statistics, open_frontier, Frontier};
use trawl::search::{connect, SearchService};
use trawl::{Crawler, SearchError, TrawlError};
use tracing_subscriber::EnvFilter;

/// Trawl: crawl pages into a search index and query them
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version)]
#[command(about = "Crawl pages into a search index and query them", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page, queue its links and index it
    Crawl {
        /// Start URL
        url: String,
    },

    /// Crawl queued URLs until the frontier is empty
    Drain {
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u64>,
    },

    /// Search indexed pages
    Search {
        /// Free-text query
        query: String,
    },

    /// Show frontier statistics and exit
    QueueStats,

    /// Validate the configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    match cli.command {
        Command::Crawl { url } => handle_crawl(&config, &url).await,
        Command::Drain { max_pages } => handle_drain(&config, max_pages).await,
        Command::Search { query } => handle_search(&config, &query).await,
        Command::QueueStats => handle_queue_stats(&config),
        Command::CheckConfig => handle_check_config(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawl=info,warn"),
            1 => EnvFilter::new("trawl=debug,info"),
            2 => EnvFilter::new("trawl=trace,debug"),
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

/// Connects to the search engine and opens the frontier
async fn build_crawler(config: &Config) -> anyhow::Result<Crawler> {
    let frontier: Arc<dyn Frontier> = Arc::new(
        open_frontier(Path::new(&config.frontier.database_path))
            .context("Failed to open frontier database")?,
    );

    let search = connect(&config.search)
        .await
        .context("Failed to connect to search engine")?;

    Ok(Crawler::new(config, search, frontier)?)
}

/// Handles the crawl command
async fn handle_crawl(config: &Config, url: &str) -> anyhow::Result<()> {
    let crawler = Arc::new(build_crawler(config).await?);

    let report = crawler
        .spawn(url)
        .await
        .map_err(TrawlError::from)
        .and_then(|result| result)
        .context("Crawl failed")?;

    println!("Crawled {}", report.url);
    println!("  Links discovered: {}", report.links_discovered);
    println!("  Links enqueued:   {}", report.links_enqueued);
    println!("  Already queued:   {}", report.links_duplicate);
    println!("  Unparseable:      {}", report.links_skipped);
    println!("  Queue failures:   {}", report.queue_failures);
    println!(
        "  Indexed:          {}",
        if report.document_indexed { "yes" } else { "no (see log)" }
    );

    Ok(())
}

/// Handles the drain command
async fn handle_drain(config: &Config, max_pages: Option<u64>) -> anyhow::Result<()> {
    let crawler = build_crawler(config).await?;

    let report = crawler.drain(max_pages).await.context("Drain failed")?;

    println!("Pages attempted: {}", report.pages_attempted);
    println!("Pages fetched:   {}", report.pages_fetched);
    println!("Pages failed:    {}", report.pages_failed);
    println!("Links enqueued:  {}", report.links_enqueued);
    println!("Index failures:  {}", report.index_failures);
    println!("Queue failures:  {}", report.queue_failures);

    Ok(())
}

/// Handles the search command
async fn handle_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let client = connect(&config.search)
        .await
        .context("Failed to connect to search engine")?;
    let service = SearchService::new(client, &config.search.index_name, config.search.result_size);

    let hits = match service.search(query).await {
        Ok(hits) => hits,
        Err(SearchError::MissingQuery(_)) => {
            anyhow::bail!("Missing search query");
        }
        Err(e) => return Err(e).context("Search failed"),
    };

    if hits.is_empty() {
        println!("No results for {:?}", query);
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        let title = hit.title.as_deref().unwrap_or("(untitled)");
        match hit.score {
            Some(score) => println!("{}. {} [{:.3}]", rank + 1, title, score),
            None => println!("{}. {}", rank + 1, title),
        }
        println!("   {}", hit.url);
    }

    Ok(())
}

/// Handles the queue-stats command
fn handle_queue_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.frontier.database_path);

    let frontier = open_frontier(Path::new(&config.frontier.database_path))?;
    let stats = load_statistics(&frontier)?;

    println!("Total URLs: {}", stats.total);
    println!("  Pending:  {}", stats.pending);
    println!("  Claimed:  {}", stats.claimed);
    println!("  Fetched:  {}", stats.fetched);
    println!("  Failed:   {}", stats.failed);

    Ok(())
}

/// Handles the check-config command
fn handle_check_config(config: &Config) -> anyhow::Result<()> {
    println!("Search engine: {}", config.search.endpoint);
    println!("  Index:      {}", config.search.index_name);
    println!("  Readiness:  {:?}", config.search.readiness);
    println!(
        "  Connect:    {} attempts, {}ms apart",
        config.search.connect_attempts, config.search.connect_backoff_ms
    );
    println!(
        "  Health:     {} checks, {}ms apart",
        config.search.health_attempts, config.search.health_interval_ms
    );
    println!("Fetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout:    {}s", config.fetcher.timeout_secs);
    println!("  Links:      {:?}", config.fetcher.link_resolution);
    println!("Frontier: {}", config.frontier.database_path);

    println!("\nConfiguration is valid");

    Ok(())
}
