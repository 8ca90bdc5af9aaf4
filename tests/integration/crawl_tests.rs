//! End-to-end crawl tests against mock sites and a mock search engine

use crate::{
    create_crawler, create_test_config, mount_page, mount_search_engine, requests_with_method,
};
use serde_json::Value;
use std::sync::Arc;
use trawl::frontier::{EntryState, Frontier, QueueError, QueueResult, SqliteFrontier};
use trawl::search::{document_id, SearchClient};
use trawl::{Crawler, FetchError, IndexError, LinkResolution, QueueEntry, TrawlError};
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn enqueue(frontier: &dyn Frontier, url: &str) {
    let url = Url::parse(url).unwrap();
    assert!(frontier.enqueue(&url).unwrap());
}

#[tokio::test]
async fn test_crawl_enqueues_links_and_indexes_page() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    let html = r#"<html><head><title>Home</title></head>
        <body><a href="/about">About</a></body></html>"#
        .to_string();
    mount_page(&site, "/", html.clone()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let seed = format!("{}/", site.uri());
    let report = crawler.crawl(&seed).await.unwrap();

    assert_eq!(report.url, seed);
    assert_eq!(report.links_discovered, 1);
    assert_eq!(report.links_enqueued, 1);
    assert!(report.document_indexed);

    let about = format!("{}/about", site.uri());
    assert!(frontier.contains(&about).unwrap());
    assert_eq!(frontier.len().unwrap(), 1);

    let writes = requests_with_method(&engine, "PUT").await;
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].url.path(),
        format!("/pages/_doc/{}", document_id(&seed))
    );

    let doc: Value = writes[0].body_json().unwrap();
    assert_eq!(doc["url"], seed.as_str());
    assert_eq!(doc["title"], "Home");
    assert_eq!(doc["content"], html.as_str());
    assert!(doc["timestamp"].is_string());

    assert_eq!(crawler.indexer_stats().indexed, 1);
}

#[tokio::test]
async fn test_seed_without_trailing_slash_is_indexed_as_given() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    let html = r#"<a href="/about">About</a>"#.to_string();
    mount_page(&site, "/", html.clone()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let seed = site.uri();
    assert!(!seed.ends_with('/'));
    let report = crawler.crawl(&seed).await.unwrap();

    assert_eq!(report.url, seed);
    assert!(frontier.contains(&format!("{}/about", seed)).unwrap());

    let writes = requests_with_method(&engine, "PUT").await;
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].url.path(),
        format!("/pages/_doc/{}", document_id(&seed))
    );

    let doc: Value = writes[0].body_json().unwrap();
    assert_eq!(doc["url"], seed.as_str());
    assert_eq!(doc["content"], html.as_str());
}

#[tokio::test]
async fn test_crawl_entry_point_runs_end_to_end() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/", r#"<a href="/about">About</a>"#.to_string()).await;

    let config = create_test_config(&engine.uri());
    let frontier = Arc::new(SqliteFrontier::new_in_memory().unwrap());
    let search = SearchClient::new(&config.search).unwrap();

    let report = trawl::crawler::crawl(&config, frontier.clone(), search, &site.uri())
        .await
        .unwrap();

    assert_eq!(report.links_enqueued, 1);
    assert!(report.document_indexed);
    assert!(frontier
        .contains(&format!("{}/about", site.uri()))
        .unwrap());
    assert_eq!(requests_with_method(&engine, "PUT").await.len(), 1);
}

#[tokio::test]
async fn test_crawl_entry_point_surfaces_fetch_failure() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    let config = create_test_config(&engine.uri());
    let frontier = Arc::new(SqliteFrontier::new_in_memory().unwrap());
    let search = SearchClient::new(&config.search).unwrap();

    let err = trawl::crawler::crawl(&config, frontier, search, &format!("{}/nope", site.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TrawlError::Fetch(FetchError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_crawl_skips_unresolvable_links() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(
        &site,
        "/",
        r#"<a href="/one">1</a><a href="http://[::1">bad</a><a href="/two">2</a>"#.to_string(),
    )
    .await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let report = crawler.crawl(&format!("{}/", site.uri())).await.unwrap();

    assert_eq!(report.links_discovered, 3);
    assert_eq!(report.links_enqueued, 2);
    assert_eq!(report.links_skipped, 1);
    assert!(report.document_indexed);
    assert!(frontier.contains(&format!("{}/one", site.uri())).unwrap());
    assert!(frontier.contains(&format!("{}/two", site.uri())).unwrap());
}

#[tokio::test]
async fn test_recrawl_does_not_duplicate_queue_or_documents() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/", r#"<a href="/about">About</a>"#.to_string()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);
    let seed = format!("{}/", site.uri());

    let first = crawler.crawl(&seed).await.unwrap();
    let second = crawler.crawl(&seed).await.unwrap();

    assert_eq!(first.links_enqueued, 1);
    assert_eq!(second.links_enqueued, 0);
    assert_eq!(second.links_duplicate, 1);
    assert_eq!(frontier.len().unwrap(), 1);

    // Both writes target the same document, so the second replaces the first
    let writes = requests_with_method(&engine, "PUT").await;
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].url.path(), writes[1].url.path());
}

#[tokio::test]
async fn test_index_write_failure_does_not_fail_crawl() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&engine)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/pages/_doc/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&engine)
        .await;

    mount_page(&site, "/", r#"<a href="/next">Next</a>"#.to_string()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let report = crawler.crawl(&format!("{}/", site.uri())).await.unwrap();

    assert!(!report.document_indexed);
    assert_eq!(report.links_enqueued, 1);
    assert!(frontier.contains(&format!("{}/next", site.uri())).unwrap());

    let stats = crawler.indexer_stats();
    assert_eq!(stats.indexed, 0);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_crawl_fails_on_error_status() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let err = crawler
        .crawl(&format!("{}/gone", site.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TrawlError::Fetch(FetchError::Status { status: 404, .. })
    ));
    assert!(frontier.is_empty().unwrap());
    assert!(requests_with_method(&engine, "PUT").await.is_empty());
}

#[tokio::test]
async fn test_crawl_fails_when_site_is_unreachable() {
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = create_test_config(&engine.uri());
    let (crawler, _frontier) = create_crawler(&config);

    let err = crawler
        .crawl(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();

    assert!(matches!(err, TrawlError::Fetch(FetchError::Http { .. })));
}

#[tokio::test]
async fn test_crawl_rejects_invalid_start_url() {
    let engine = MockServer::start().await;

    let config = create_test_config(&engine.uri());
    let (crawler, _frontier) = create_crawler(&config);

    let err = crawler.crawl("not a url").await.unwrap_err();

    assert!(matches!(err, TrawlError::Fetch(FetchError::InvalidUrl { .. })));
    assert!(engine.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_index_creation_failure_aborts_before_fetch() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&engine)
        .await;
    Mock::given(method("PUT"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
        .mount(&engine)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
        .expect(0)
        .mount(&site)
        .await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let err = crawler
        .crawl(&format!("{}/", site.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TrawlError::Index(IndexError::Create { status: 500, .. })
    ));
    assert!(frontier.is_empty().unwrap());
}

async fn mount_redirecting_site(site: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/docs/guide/"))
        .mount(site)
        .await;
    mount_page(site, "/docs/guide/", r#"<a href="next.html">Next</a>"#.to_string()).await;
}

#[tokio::test]
async fn test_links_resolve_against_seed_by_default() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;
    mount_redirecting_site(&site).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let report = crawler
        .crawl(&format!("{}/start", site.uri()))
        .await
        .unwrap();

    assert_eq!(report.url, format!("{}/docs/guide/", site.uri()));
    assert!(frontier
        .contains(&format!("{}/next.html", site.uri()))
        .unwrap());
}

#[tokio::test]
async fn test_links_resolve_against_page_when_configured() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;
    mount_redirecting_site(&site).await;

    let mut config = create_test_config(&engine.uri());
    config.fetcher.link_resolution = LinkResolution::PageRelative;
    let (crawler, frontier) = create_crawler(&config);

    crawler
        .crawl(&format!("{}/start", site.uri()))
        .await
        .unwrap();

    assert!(frontier
        .contains(&format!("{}/docs/guide/next.html", site.uri()))
        .unwrap());
    assert!(!frontier
        .contains(&format!("{}/next.html", site.uri()))
        .unwrap());
}

#[tokio::test]
async fn test_non_html_page_is_indexed_without_links() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("see <a href=\"/hidden\">here</a>", "text/plain"),
        )
        .mount(&site)
        .await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let report = crawler
        .crawl(&format!("{}/notes.txt", site.uri()))
        .await
        .unwrap();

    assert_eq!(report.links_discovered, 0);
    assert!(report.document_indexed);
    assert!(frontier.is_empty().unwrap());

    let writes = requests_with_method(&engine, "PUT").await;
    let doc: Value = writes[0].body_json().unwrap();
    assert!(doc.get("title").is_none());
}

#[tokio::test]
async fn test_spawned_crawl_reports_through_handle() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#.to_string()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let handle = crawler.spawn(format!("{}/", site.uri()));
    let report = handle.await.unwrap().unwrap();

    assert_eq!(report.links_enqueued, 2);
    assert_eq!(frontier.len().unwrap(), 2);
}

#[tokio::test]
async fn test_drain_crawls_until_frontier_is_empty() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/one", r#"<a href="/two">two</a>"#.to_string()).await;
    mount_page(&site, "/two", "<p>leaf</p>".to_string()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    let one = format!("{}/one", site.uri());
    let missing = format!("{}/missing", site.uri());
    let two = format!("{}/two", site.uri());
    enqueue(frontier.as_ref(), &one);
    enqueue(frontier.as_ref(), &missing);

    let report = crawler.drain(None).await.unwrap();

    assert_eq!(report.pages_attempted, 3);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.links_enqueued, 1);
    assert_eq!(report.index_failures, 0);

    assert_eq!(frontier.get(&one).unwrap().unwrap().state, EntryState::Fetched);
    assert_eq!(frontier.get(&two).unwrap().unwrap().state, EntryState::Fetched);
    assert_eq!(
        frontier.get(&missing).unwrap().unwrap().state,
        EntryState::Failed
    );
    assert_eq!(frontier.count_by_state(EntryState::Pending).unwrap(), 0);
}

#[tokio::test]
async fn test_drain_respects_page_limit() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/one", "<p>one</p>".to_string()).await;
    mount_page(&site, "/two", "<p>two</p>".to_string()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    enqueue(frontier.as_ref(), &format!("{}/one", site.uri()));
    enqueue(frontier.as_ref(), &format!("{}/two", site.uri()));

    let report = crawler.drain(Some(1)).await.unwrap();

    assert_eq!(report.pages_attempted, 1);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(frontier.count_by_state(EntryState::Pending).unwrap(), 1);
    assert_eq!(frontier.count_by_state(EntryState::Claimed).unwrap(), 0);
}

#[tokio::test]
async fn test_drain_releases_stale_claims() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/one", "<p>one</p>".to_string()).await;

    let config = create_test_config(&engine.uri());
    let (crawler, frontier) = create_crawler(&config);

    enqueue(frontier.as_ref(), &format!("{}/one", site.uri()));
    assert_eq!(frontier.claim_batch(10).unwrap().len(), 1);

    let report = crawler.drain(None).await.unwrap();

    assert_eq!(report.claims_released, 1);
    assert_eq!(report.pages_fetched, 1);
}

/// Frontier whose state updates always fail
struct StuckFrontier(SqliteFrontier);

impl Frontier for StuckFrontier {
    fn enqueue(&self, url: &Url) -> QueueResult<bool> {
        self.0.enqueue(url)
    }

    fn contains(&self, url: &str) -> QueueResult<bool> {
        self.0.contains(url)
    }

    fn get(&self, url: &str) -> QueueResult<Option<QueueEntry>> {
        self.0.get(url)
    }

    fn claim_batch(&self, limit: u32) -> QueueResult<Vec<QueueEntry>> {
        self.0.claim_batch(limit)
    }

    fn mark_fetched(&self, _url: &str) -> QueueResult<()> {
        Err(QueueError::Poisoned)
    }

    fn mark_failed(&self, _url: &str) -> QueueResult<()> {
        Err(QueueError::Poisoned)
    }

    fn release_claims(&self) -> QueueResult<u64> {
        self.0.release_claims()
    }

    fn len(&self) -> QueueResult<u64> {
        self.0.len()
    }

    fn count_by_state(&self, state: EntryState) -> QueueResult<u64> {
        self.0.count_by_state(state)
    }
}

#[tokio::test]
async fn test_drain_continues_past_queue_update_failures() {
    let site = MockServer::start().await;
    let engine = MockServer::start().await;
    mount_search_engine(&engine).await;

    mount_page(&site, "/one", "<p>one</p>".to_string()).await;
    mount_page(&site, "/two", "<p>two</p>".to_string()).await;

    let config = create_test_config(&engine.uri());
    let frontier = Arc::new(StuckFrontier(SqliteFrontier::new_in_memory().unwrap()));
    enqueue(frontier.as_ref(), &format!("{}/one", site.uri()));
    enqueue(frontier.as_ref(), &format!("{}/missing", site.uri()));
    enqueue(frontier.as_ref(), &format!("{}/two", site.uri()));

    let search = SearchClient::new(&config.search).unwrap();
    let crawler = Crawler::new(&config, search, frontier.clone()).unwrap();

    let report = crawler.drain(None).await.unwrap();

    assert_eq!(report.pages_attempted, 3);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.queue_failures, 3);
    assert_eq!(requests_with_method(&engine, "PUT").await.len(), 2);
    assert_eq!(frontier.count_by_state(EntryState::Pending).unwrap(), 0);
}
