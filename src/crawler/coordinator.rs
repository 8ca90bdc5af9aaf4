//! Crawler coordinator - crawl orchestration logic
//!
//! A crawl is sequential: fetch, extract and enqueue links, then index the
//! page. Only index creation and the fetch itself can fail a crawl. Link
//! resolution and enqueue failures are contained per link, and indexing
//! failures per document; both are counted in the returned report.

use crate::config::Config;
use crate::crawler::parser::parse_html;
use crate::crawler::{build_http_client, fetch_page, LinkResolution};
use crate::frontier::Frontier;
use crate::search::{
    ensure_index, page_mapping, EnsureOutcome, Indexer, IndexerStats, PageDocument, SearchClient,
};
use crate::{FetchError, IndexError, TrawlError};
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

/// Outcome of crawling one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// URL the page was indexed under
    pub url: String,
    /// Anchor hrefs found on the page
    pub links_discovered: usize,
    /// Links newly added to the frontier
    pub links_enqueued: usize,
    /// Links the frontier already held
    pub links_duplicate: usize,
    /// Hrefs that failed to resolve
    pub links_skipped: usize,
    /// Links the frontier failed to store
    pub queue_failures: usize,
    /// Whether the page document was written to the index
    pub document_indexed: bool,
}

impl CrawlReport {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            links_discovered: 0,
            links_enqueued: 0,
            links_duplicate: 0,
            links_skipped: 0,
            queue_failures: 0,
            document_indexed: false,
        }
    }
}

/// Outcome of draining the frontier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Stale claims returned to pending before draining
    pub claims_released: u64,
    /// Entries claimed and attempted
    pub pages_attempted: u64,
    /// Entries fetched successfully
    pub pages_fetched: u64,
    /// Entries whose fetch failed
    pub pages_failed: u64,
    /// Links newly added to the frontier while draining
    pub links_enqueued: u64,
    /// Fetched pages whose document write failed
    pub index_failures: u64,
    /// Entries whose fetched or failed state could not be recorded
    pub queue_failures: u64,
}

/// Crawl pipeline over a shared search client and frontier
///
/// A `Crawler` is `Send + Sync`; wrap it in an `Arc` to trigger crawls from
/// several tasks.
pub struct Crawler {
    http: Client,
    search: SearchClient,
    frontier: Arc<dyn Frontier>,
    indexer: Indexer,
    index_name: String,
    link_resolution: LinkResolution,
    claim_batch_size: u32,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Errors
    ///
    /// Fails if the page HTTP client cannot be built.
    pub fn new(
        config: &Config,
        search: SearchClient,
        frontier: Arc<dyn Frontier>,
    ) -> Result<Self, TrawlError> {
        let http = build_http_client(&config.fetcher).map_err(FetchError::Client)?;
        let index_name = config.search.index_name.clone();

        Ok(Self {
            http,
            indexer: Indexer::new(search.clone(), index_name.clone()),
            search,
            frontier,
            index_name,
            link_resolution: config.fetcher.link_resolution,
            claim_batch_size: config.frontier.claim_batch_size.max(1),
        })
    }

    pub fn frontier(&self) -> &Arc<dyn Frontier> {
        &self.frontier
    }

    /// Document write counters across every crawl run by this crawler
    pub fn indexer_stats(&self) -> IndexerStats {
        self.indexer.stats()
    }

    /// Ensures the page index exists
    pub async fn ensure_index(&self) -> Result<EnsureOutcome, IndexError> {
        ensure_index(&self.search, &self.index_name, &page_mapping()).await
    }

    /// Crawls a single start URL
    ///
    /// Exactly one page is fetched; discovered links are only enqueued.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlReport, TrawlError> {
        let seed = Url::parse(start_url).map_err(|source| FetchError::InvalidUrl {
            url: start_url.to_string(),
            source,
        })?;

        if let Err(e) = self.ensure_index().await {
            tracing::error!("Failed to ensure index {}: {}", self.index_name, e);
            return Err(e.into());
        }

        tracing::info!("Starting crawl of {}", seed);
        let report = self.visit(start_url, &seed).await?;
        tracing::info!(
            "Crawl of {} finished: {} links discovered, {} enqueued, {} duplicate, {} skipped, {} queue failures, indexed: {}",
            report.url,
            report.links_discovered,
            report.links_enqueued,
            report.links_duplicate,
            report.links_skipped,
            report.queue_failures,
            report.document_indexed
        );

        Ok(report)
    }

    /// Starts a crawl as a detached background task
    ///
    /// Errors are logged by the task and also returned through the handle.
    pub fn spawn(
        self: &Arc<Self>,
        start_url: impl Into<String>,
    ) -> JoinHandle<Result<CrawlReport, TrawlError>> {
        let crawler = Arc::clone(self);
        let start_url = start_url.into();

        tokio::spawn(async move {
            let result = crawler.crawl(&start_url).await;
            if let Err(e) = &result {
                tracing::error!("Crawler error for {}: {}", start_url, e);
            }
            result
        })
    }

    /// Fetches one page, enqueues its links and indexes it
    ///
    /// Without a redirect the page is indexed under `start_url` exactly as
    /// given, so `https://example.com` does not become `https://example.com/`.
    async fn visit(&self, start_url: &str, seed: &Url) -> Result<CrawlReport, FetchError> {
        let page = fetch_page(&self.http, seed).await?;
        let page_url = if page.final_url == *seed {
            start_url.to_string()
        } else {
            page.final_url.to_string()
        };
        let mut report = CrawlReport::new(page_url);
        let mut title = None;

        if page.is_html() {
            let base = self.link_resolution.base(seed, &page.final_url);
            let parsed = parse_html(&page.body, base);
            report.links_discovered = parsed.links_discovered();

            for skipped in &parsed.skipped {
                tracing::warn!(
                    "Error parsing URL '{}' on {}: {}",
                    skipped.href,
                    page.final_url,
                    skipped.reason
                );
                report.links_skipped += 1;
            }

            for link in &parsed.links {
                match self.frontier.enqueue(link) {
                    Ok(true) => report.links_enqueued += 1,
                    Ok(false) => {
                        tracing::debug!("Already queued: {}", link);
                        report.links_duplicate += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Error inserting '{}' into queue: {}", link, e);
                        report.queue_failures += 1;
                    }
                }
            }

            title = parsed.title;
        }

        let doc = PageDocument::new(report.url.as_str(), title, page.body, page.fetched_at);
        report.document_indexed = self.indexer.index_document(&doc).await;

        Ok(report)
    }

    /// Drains pending frontier entries with a single sequential worker
    ///
    /// Stale claims are released first, so only one drain should run per
    /// database. Each claimed URL is crawled as its own seed. Stops when the
    /// frontier has no pending entries or after `max_pages` attempts.
    pub async fn drain(&self, max_pages: Option<u64>) -> Result<DrainReport, TrawlError> {
        let mut report = DrainReport {
            claims_released: self.frontier.release_claims()?,
            ..Default::default()
        };

        if report.claims_released > 0 {
            tracing::info!("Released {} stale claims", report.claims_released);
        }

        self.ensure_index().await?;

        loop {
            let limit = match max_pages {
                Some(max) if report.pages_attempted >= max => break,
                Some(max) => {
                    (max - report.pages_attempted).min(u64::from(self.claim_batch_size)) as u32
                }
                None => self.claim_batch_size,
            };

            let batch = self.frontier.claim_batch(limit)?;
            if batch.is_empty() {
                tracing::info!("Frontier is empty, drain complete");
                break;
            }

            for entry in batch {
                report.pages_attempted += 1;

                let outcome = match Url::parse(&entry.url) {
                    Ok(url) => self.visit(&entry.url, &url).await,
                    Err(source) => Err(FetchError::InvalidUrl {
                        url: entry.url.clone(),
                        source,
                    }),
                };

                let marked = match outcome {
                    Ok(page) => {
                        report.pages_fetched += 1;
                        report.links_enqueued += page.links_enqueued as u64;
                        if !page.document_indexed {
                            report.index_failures += 1;
                        }
                        self.frontier.mark_fetched(&entry.url)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to crawl {}: {}", entry.url, e);
                        report.pages_failed += 1;
                        self.frontier.mark_failed(&entry.url)
                    }
                };

                if let Err(e) = marked {
                    tracing::warn!("Error updating queue state of '{}': {}", entry.url, e);
                    report.queue_failures += 1;
                }
            }

            tracing::info!(
                "Progress: {} pages attempted, {} fetched, {} failed",
                report.pages_attempted,
                report.pages_fetched,
                report.pages_failed
            );
        }

        Ok(report)
    }
}
