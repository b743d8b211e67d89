use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::extractor;
use crate::traits::DocumentFetcher;
use crate::types::{Article, Result, ScannerError};

/// One category endpoint of a site, as configured.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub url: String,
}

/// Everything required to execute one scan of one site.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub day: DateTime<Utc>,
    pub site_name: String,
    pub categories: Vec<Category>,
    pub options: HashMap<String, String>,
}

/// A named scanning strategy (arxiv-style listings today, others later).
#[async_trait]
pub trait ScanStrategy: Send + Sync {
    /// Identifies the strategy inside the registry.
    fn name(&self) -> &str;

    /// Returns all articles published on the requested day across the
    /// request's categories, deduplicated by external id.
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<Article>>;
}

/// Maps strategy names to their implementations.
#[derive(Default)]
pub struct ScannerRegistry {
    strategies: HashMap<String, Arc<dyn ScanStrategy>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a strategy under its own name.
    pub fn register(&mut self, strategy: Arc<dyn ScanStrategy>) {
        self.strategies.insert(strategy.name().to_string(), strategy);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ScanStrategy>> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| ScannerError::UnknownStrategy {
                name: name.to_string(),
            })
    }
}

const DEFAULT_PAGE_SIZE: usize = 200;

/// Crawls paginated category listings and extracts the articles published
/// on the requested day.
pub struct ArxivScanner {
    fetcher: Arc<dyn DocumentFetcher>,
    page_size: usize,
}

impl ArxivScanner {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl ScanStrategy for ArxivScanner {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Vec<Article>> {
        if request.categories.is_empty() {
            return Err(ScannerError::NoCategories {
                site: request.site_name.clone(),
            });
        }

        let page_size = request
            .options
            .get("page_size")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.page_size);
        let target_day = request.day.date_naive();

        debug!(
            site = %request.site_name,
            categories = request.categories.len(),
            target_day = %target_day,
            "scan start"
        );

        let mut results: Vec<Article> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for category in &request.categories {
            let in_category = |e: ScannerError| e.context(format!("category {}", category.name));

            let base = Url::parse(&category.url)
                .map_err(|e| in_category(ScannerError::from(e)))?;
            let mut skip = 0usize;

            loop {
                let page_url = build_page_url(&category.url, skip, page_size)
                    .map_err(&in_category)?;
                debug!(
                    site = %request.site_name,
                    category = %category.name,
                    skip,
                    url = %page_url,
                    "fetching"
                );

                let body = self.fetcher.fetch(&page_url).await.map_err(&in_category)?;
                let page = {
                    let document = Html::parse_document(&body);
                    extractor::extract_listing(
                        &document,
                        target_day,
                        &request.site_name,
                        &category.name,
                        &base,
                        page_size,
                    )
                };
                debug!(
                    category = %category.name,
                    skip,
                    articles = page.articles.len(),
                    continue_paging = page.continue_paging,
                    "page processed"
                );

                // Cross-listings can surface the same id in several
                // categories; only the first occurrence is kept.
                for article in page.articles {
                    if seen.insert(article.id.clone()) {
                        results.push(article);
                    }
                }

                if !page.continue_paging {
                    break;
                }
                skip += page_size;
            }
        }

        debug!(site = %request.site_name, total = results.len(), "scan finished");
        Ok(results)
    }
}

/// Rebuilds the category URL with `skip`/`show` set for the cursor while
/// preserving every other query parameter.
pub fn build_page_url(base: &str, skip: usize, show: usize) -> Result<String> {
    let mut parsed = Url::parse(base)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != "skip" && k != "show")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("skip", &skip.to_string());
        pairs.append_pair("show", &show.to_string());
    }

    Ok(parsed.into())
}
