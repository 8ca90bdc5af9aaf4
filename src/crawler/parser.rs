//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Anchor hrefs, resolved against a base URL
//! - Page title
//! - Hrefs that could not be resolved, so callers can log and count them

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Every href that resolved to an absolute URL, in document order
    pub links: Vec<Url>,

    /// Hrefs that failed to resolve
    pub skipped: Vec<SkippedLink>,
}

impl ParsedPage {
    /// Number of anchor hrefs found, resolved or not
    pub fn links_discovered(&self) -> usize {
        self.links.len() + self.skipped.len()
    }
}

/// An href that could not be turned into an absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    pub href: String,
    pub reason: String,
}

/// Parses HTML content and extracts links and metadata
///
/// Every `<a href>` is resolved with [`Url::join`] against `base_url`. No
/// scheme filtering is applied: whatever resolves is returned. An href that
/// fails to parse is reported in [`ParsedPage::skipped`] and never aborts
/// the page.
///
/// # Example
///
/// ```
/// use trawl::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="../b.html">B</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/a/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/b.html");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);

    let mut parsed = ParsedPage {
        title,
        ..Default::default()
    };

    for href in extract_hrefs(&document) {
        match resolve_link(&href, base_url) {
            Ok(url) => parsed.links.push(url),
            Err(e) => parsed.skipped.push(SkippedLink {
                href,
                reason: e.to_string(),
            }),
        }
    }

    parsed
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects raw href attribute values from anchor elements
fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Resolves an href (possibly relative) against the base URL
pub fn resolve_link(href: &str, base_url: &Url) -> Result<Url, url::ParseError> {
    base_url.join(href.trim())
}
