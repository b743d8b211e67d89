use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::SiteConfig;
use crate::scanner::{Category, ScanRequest, ScannerRegistry};
use crate::traits::ArticleSource;
use crate::types::{Article, Result};

/// Article source backed by the strategy registry: each configured site is
/// scanned with its named strategy and the results are concatenated in
/// configuration order.
pub struct StrategySource {
    registry: ScannerRegistry,
    sites: Vec<SiteConfig>,
}

impl StrategySource {
    pub fn new(registry: ScannerRegistry, sites: Vec<SiteConfig>) -> Self {
        Self { registry, sites }
    }
}

#[async_trait]
impl ArticleSource for StrategySource {
    async fn fetch_daily(&self, day: DateTime<Utc>) -> Result<Vec<Article>> {
        debug!(sites = self.sites.len(), day = %day.date_naive(), "fetch daily");

        let mut aggregated: Vec<Article> = Vec::new();
        for site in &self.sites {
            debug!(
                site = %site.name,
                strategy = %site.strategy,
                categories = site.categories.len(),
                "process site"
            );

            let strategy = self
                .registry
                .resolve(&site.strategy)
                .map_err(|e| e.context(format!("site {}", site.name)))?;

            let request = ScanRequest {
                day,
                site_name: site.name.clone(),
                categories: site
                    .categories
                    .iter()
                    .map(|c| Category {
                        name: c.name.clone(),
                        url: c.url.clone(),
                    })
                    .collect(),
                options: site.options.clone(),
            };

            let mut results = strategy
                .scan(&request)
                .await
                .map_err(|e| e.context(format!("scan site {}", site.name)))?;

            for article in &mut results {
                if article.source.is_empty() {
                    article.source = site.name.clone();
                }
            }

            debug!(site = %site.name, count = results.len(), "site produced articles");
            aggregated.extend(results);
        }

        debug!(total = aggregated.len(), "strategy source done");
        Ok(aggregated)
    }
}
