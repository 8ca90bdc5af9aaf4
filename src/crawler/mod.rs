//! Crawler module for page fetching and indexing
//!
//! This module contains the crawl pipeline, including:
//! - HTTP fetching of the seed page
//! - HTML parsing and link extraction
//! - Enqueueing discovered links into the frontier
//! - Handing the fetched page to the indexer
//! - Draining the frontier with a sequential worker

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{CrawlReport, Crawler, DrainReport};
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use parser::{parse_html, resolve_link, ParsedPage, SkippedLink};

use crate::config::Config;
use crate::frontier::Frontier;
use crate::search::SearchClient;
use crate::TrawlError;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Which URL relative links are resolved against
///
/// `SeedRelative` anchors every link to the crawl's start URL, not to the page
/// that contained it. When a redirect moves the page to a different path,
/// the two policies discover different URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkResolution {
    /// Resolve against the URL the crawl was started with
    #[default]
    SeedRelative,
    /// Resolve against the final URL of the fetched page
    PageRelative,
}

impl LinkResolution {
    /// Picks the base URL for link resolution
    pub fn base<'a>(&self, seed: &'a Url, page: &'a Url) -> &'a Url {
        match self {
            Self::SeedRelative => seed,
            Self::PageRelative => page,
        }
    }
}

/// Runs a single crawl of `start_url`
///
/// This is the main entry point for triggering a crawl. It will:
/// 1. Ensure the page index exists
/// 2. Fetch the start URL
/// 3. Enqueue every discovered link into the frontier
/// 4. Index the fetched page
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The page was fetched; link and indexing failures are counted in the report
/// * `Err(TrawlError)` - Index creation or the fetch failed
pub async fn crawl(
    config: &Config,
    frontier: Arc<dyn Frontier>,
    search: SearchClient,
    start_url: &str,
) -> Result<CrawlReport, TrawlError> {
    let crawler = Crawler::new(config, search, frontier)?;
    crawler.crawl(start_url).await
}
