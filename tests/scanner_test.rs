use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use article_scanner::aggregator::StrategySource;
use article_scanner::config::{CategoryConfig, SiteConfig};
use article_scanner::scanner::{
    build_page_url, ArxivScanner, Category, ScanRequest, ScanStrategy, ScannerRegistry,
};
use article_scanner::traits::{ArticleSource, DocumentFetcher};
use article_scanner::types::{Article, Result, ScannerError};

/// Serves canned listing pages keyed by exact URL and records every fetch.
struct StubFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScannerError::General(format!("no page for {url}")))
    }
}

fn entry(id: &str, date: &str, title: &str) -> String {
    format!(
        r#"<dt><span class="list-identifier"><a href="/abs/{id}">arXiv:{id}</a></span></dt>
<dd><div class="list-date">Date: {date}</div>
<div class="list-title mathjax">Title: {title}</div>
<p class="mathjax">Abstract: about {id}.</p></dd>"#
    )
}

fn listing(entries: &[String]) -> String {
    format!("<html><body><dl>{}</dl></body></html>", entries.join("\n"))
}

fn request(day_y: i32, day_m: u32, day_d: u32, categories: Vec<Category>) -> ScanRequest {
    ScanRequest {
        day: Utc.with_ymd_and_hms(day_y, day_m, day_d, 12, 0, 0).unwrap(),
        site_name: "arxiv-test".to_string(),
        categories,
        options: HashMap::new(),
    }
}

#[tokio::test]
async fn same_day_entries_collected_and_scan_stops_after_one_page() -> Result<()> {
    let category_url = "https://example.org/list/cs.AI";
    let page = listing(&[
        entry("2501.00001", "8 Nov 2025", "Fresh One"),
        entry("2501.00002", "8 Nov 2025", "Fresh Two"),
        entry("2501.00003", "7 Nov 2025", "Old"),
    ]);

    let mut pages = HashMap::new();
    pages.insert(build_page_url(category_url, 0, 10)?, page);
    let fetcher = Arc::new(StubFetcher::new(pages));

    let scanner = ArxivScanner::new(fetcher.clone()).with_page_size(10);
    let articles = scanner
        .scan(&request(
            2025,
            11,
            8,
            vec![Category {
                name: "cs.AI".to_string(),
                url: category_url.to_string(),
            }],
        ))
        .await?;

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].id, "arXiv:2501.00001");
    assert_eq!(articles[1].id, "arXiv:2501.00002");
    assert_eq!(fetcher.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_category_list_fails_without_fetching() {
    let fetcher = Arc::new(StubFetcher::new(HashMap::new()));
    let scanner = ArxivScanner::new(fetcher.clone());

    let err = scanner
        .scan(&request(2025, 11, 8, Vec::new()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no categories"));
    assert_eq!(fetcher.request_count(), 0);
}

#[tokio::test]
async fn full_pages_advance_the_cursor_until_a_short_page() -> Result<()> {
    let category_url = "https://example.org/list/cs.AI";
    let first = listing(&[
        entry("2501.00001", "8 Nov 2025", "One"),
        entry("2501.00002", "8 Nov 2025", "Two"),
    ]);
    let second = listing(&[entry("2501.00003", "8 Nov 2025", "Three")]);

    let mut pages = HashMap::new();
    pages.insert(build_page_url(category_url, 0, 2)?, first);
    pages.insert(build_page_url(category_url, 2, 2)?, second);
    let fetcher = Arc::new(StubFetcher::new(pages));

    let scanner = ArxivScanner::new(fetcher.clone()).with_page_size(2);
    let articles = scanner
        .scan(&request(
            2025,
            11,
            8,
            vec![Category {
                name: "cs.AI".to_string(),
                url: category_url.to_string(),
            }],
        ))
        .await?;

    assert_eq!(articles.len(), 3);
    assert_eq!(fetcher.request_count(), 2);
    Ok(())
}

#[tokio::test]
async fn no_page_is_fetched_past_an_older_entry() -> Result<()> {
    let category_url = "https://example.org/list/cs.AI";
    // A full page whose last entry is already older than the window: the
    // scanner must stop without requesting the next cursor position.
    let page = listing(&[
        entry("2501.00001", "8 Nov 2025", "Fresh"),
        entry("2501.00002", "7 Nov 2025", "Old"),
    ]);

    let mut pages = HashMap::new();
    pages.insert(build_page_url(category_url, 0, 2)?, page);
    let fetcher = Arc::new(StubFetcher::new(pages));

    let scanner = ArxivScanner::new(fetcher.clone()).with_page_size(2);
    let articles = scanner
        .scan(&request(
            2025,
            11,
            8,
            vec![Category {
                name: "cs.AI".to_string(),
                url: category_url.to_string(),
            }],
        ))
        .await?;

    assert_eq!(articles.len(), 1);
    assert_eq!(fetcher.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn cross_listed_ids_are_reported_once() -> Result<()> {
    let ai_url = "https://example.org/list/cs.AI";
    let lg_url = "https://example.org/list/cs.LG";
    let shared = entry("2501.00042", "8 Nov 2025", "Cross Listed");

    let mut pages = HashMap::new();
    pages.insert(
        build_page_url(ai_url, 0, 10)?,
        listing(&[shared.clone(), entry("2501.00001", "8 Nov 2025", "Only AI")]),
    );
    pages.insert(build_page_url(lg_url, 0, 10)?, listing(&[shared]));
    let fetcher = Arc::new(StubFetcher::new(pages));

    let scanner = ArxivScanner::new(fetcher).with_page_size(10);
    let articles = scanner
        .scan(&request(
            2025,
            11,
            8,
            vec![
                Category {
                    name: "cs.AI".to_string(),
                    url: ai_url.to_string(),
                },
                Category {
                    name: "cs.LG".to_string(),
                    url: lg_url.to_string(),
                },
            ],
        ))
        .await?;

    let cross_listed: Vec<&Article> = articles
        .iter()
        .filter(|a| a.id == "arXiv:2501.00042")
        .collect();
    assert_eq!(cross_listed.len(), 1);
    // Provenance reflects the category that surfaced the id first.
    assert_eq!(cross_listed[0].source, "arxiv-test/cs.AI");
    assert_eq!(articles.len(), 2);
    Ok(())
}

#[tokio::test]
async fn failing_category_fails_the_whole_scan() {
    let fetcher = Arc::new(StubFetcher::new(HashMap::new()));
    let scanner = ArxivScanner::new(fetcher).with_page_size(10);

    let err = scanner
        .scan(&request(
            2025,
            11,
            8,
            vec![Category {
                name: "cs.CR".to_string(),
                url: "https://example.org/list/cs.CR".to_string(),
            }],
        ))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("category cs.CR"));
}

/// Strategy stub used to exercise the aggregator without HTTP plumbing.
struct CannedStrategy {
    name: String,
    articles: Vec<Article>,
}

#[async_trait]
impl ScanStrategy for CannedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, _request: &ScanRequest) -> Result<Vec<Article>> {
        Ok(self.articles.clone())
    }
}

fn bare_article(id: &str, source: &str) -> Article {
    Article {
        id: id.to_string(),
        title: format!("title {id}"),
        abstract_text: String::new(),
        url: format!("https://example.org/abs/{id}"),
        source: source.to_string(),
        published_at: Utc::now(),
    }
}

fn site(name: &str, strategy: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        strategy: strategy.to_string(),
        categories: vec![CategoryConfig {
            name: "main".to_string(),
            url: "https://example.org/list/main".to_string(),
        }],
        options: HashMap::new(),
    }
}

#[tokio::test]
async fn aggregator_backfills_empty_provenance() -> Result<()> {
    let mut registry = ScannerRegistry::new();
    registry.register(Arc::new(CannedStrategy {
        name: "canned".to_string(),
        articles: vec![bare_article("a", ""), bare_article("b", "already/set")],
    }));

    let source = StrategySource::new(registry, vec![site("mirror-one", "canned")]);
    let articles = source.fetch_daily(Utc::now()).await?;

    assert_eq!(articles[0].source, "mirror-one");
    assert_eq!(articles[1].source, "already/set");
    Ok(())
}

#[tokio::test]
async fn aggregator_rejects_unknown_strategy_naming_the_site() {
    let source = StrategySource::new(ScannerRegistry::new(), vec![site("mirror-two", "ieee")]);
    let err = source.fetch_daily(Utc::now()).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("mirror-two"));
    assert!(message.contains("ieee"));
}

#[tokio::test]
async fn aggregator_preserves_site_order() -> Result<()> {
    let mut registry = ScannerRegistry::new();
    registry.register(Arc::new(CannedStrategy {
        name: "first".to_string(),
        articles: vec![bare_article("a", "")],
    }));
    registry.register(Arc::new(CannedStrategy {
        name: "second".to_string(),
        articles: vec![bare_article("b", "")],
    }));

    let source = StrategySource::new(
        registry,
        vec![site("site-one", "first"), site("site-two", "second")],
    );
    let articles = source.fetch_daily(Utc::now()).await?;

    let ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    Ok(())
}
