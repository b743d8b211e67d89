use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Article, ArticleReview, ProcessedArticle, Result};

/// Transport for listing pages: one GET returning the raw document body.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Pulls fresh articles for one day from upstream providers.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_daily(&self, day: DateTime<Utc>) -> Result<Vec<Article>>;
}

/// Persists processed articles for deduplication and history.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Returns the subset of `ids` already known to storage. An empty
    /// input yields an empty set without touching the backend.
    async fn already_processed(&self, ids: &[String]) -> Result<HashSet<String>>;

    /// Idempotent upsert keyed by the article's external id.
    async fn save_processed(&self, article: &ProcessedArticle) -> Result<()>;
}

/// Scores articles for prioritization; the returned review carries at
/// least the original article.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn rank(&self, article: &Article) -> Result<ArticleReview>;
}

/// Generates the final summary from the downloaded payload.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, article: &Article, content: &[u8]) -> Result<String>;
}

/// Fetches full-text payloads. `None` means the article had no content
/// to download, which is success rather than an error.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, article: &Article) -> Result<Option<Vec<u8>>>;
}

/// Pushes structured digests to a chat-completion style API.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_digest(&self, payload: &[u8]) -> Result<()>;
}

/// Delivers rendered digests to an outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish_digest(&self, digest: &str) -> Result<()>;
}
