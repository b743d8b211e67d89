use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::digest;
use crate::traits::{
    Analyzer, ArticleRepository, ArticleSource, ChatClient, Downloader, Notifier, Summarizer,
};
use crate::types::{ArticleReview, ProcessedArticle, ProcessingStatus, Result};

/// Orchestrates one ingestion cycle: fetch, known-id filtering, per-item
/// enrichment, persistence, digest composition, and delivery.
///
/// Every collaborator except the source is optional; an absent capability
/// silently skips its step. Stages run strictly in order and the first
/// failure aborts the cycle; earlier persistence writes are left in place.
pub struct IngestionPipeline {
    source: Arc<dyn ArticleSource>,
    repository: Option<Arc<dyn ArticleRepository>>,
    analyzer: Option<Arc<dyn Analyzer>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    downloader: Option<Arc<dyn Downloader>>,
    chat_client: Option<Arc<dyn ChatClient>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl IngestionPipeline {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self {
            source,
            repository: None,
            analyzer: None,
            summarizer: None,
            downloader: None,
            chat_client: None,
            notifier: None,
        }
    }

    pub fn with_repository(mut self, repository: Arc<dyn ArticleRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn with_chat_client(mut self, chat_client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(chat_client);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Runs one full cycle for the given day.
    pub async fn process_day(&self, day: DateTime<Utc>) -> Result<()> {
        debug!(day = %day.date_naive(), "starting pipeline");

        let articles = self
            .source
            .fetch_daily(day)
            .await
            .map_err(|e| e.context("fetch daily"))?;
        debug!(count = articles.len(), "source returned articles");

        let ids: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();
        let known: HashSet<String> = match &self.repository {
            Some(repository) if !ids.is_empty() => repository
                .already_processed(&ids)
                .await
                .map_err(|e| e.context("load processed"))?,
            _ => HashSet::new(),
        };

        let mut reviews: Vec<ArticleReview> = Vec::new();
        for article in articles {
            if known.contains(&article.id) {
                debug!(article_id = %article.id, "skip article (already processed)");
                continue;
            }

            debug!(article_id = %article.id, "processing article");

            let mut review = ArticleReview::from_article(article.clone());

            if let Some(analyzer) = &self.analyzer {
                review = analyzer
                    .rank(&article)
                    .await
                    .map_err(|e| e.context(format!("rank article {}", article.id)))?;
            }

            let mut payload: Vec<u8> = Vec::new();
            if let Some(downloader) = &self.downloader {
                if let Some(content) = downloader
                    .download(&article)
                    .await
                    .map_err(|e| e.context(format!("download article {}", article.id)))?
                {
                    payload = content;
                }
            }

            if let Some(summarizer) = &self.summarizer {
                review.summary = summarizer
                    .summarize(&article, &payload)
                    .await
                    .map_err(|e| e.context(format!("summarize article {}", article.id)))?;
            }

            let processed = ProcessedArticle {
                article: review.article.clone(),
                summary: review.summary.clone(),
                score: review.score,
                status: ProcessingStatus::Delivered,
            };
            reviews.push(review);

            if let Some(repository) = &self.repository {
                repository
                    .save_processed(&processed)
                    .await
                    .map_err(|e| e.context(format!("persist article {}", article.id)))?;
            }
        }

        if reviews.is_empty() {
            debug!(day = %day.date_naive(), "no articles processed");
            return Ok(());
        }

        if let Some(chat_client) = &self.chat_client {
            let payload = digest::build_digest_json(&reviews)?;
            chat_client
                .send_digest(&payload)
                .await
                .map_err(|e| e.context("send digest to chat relay"))?;
            debug!(count = reviews.len(), "sent digest to chat relay");
        }

        let Some(notifier) = &self.notifier else {
            return Ok(());
        };

        let message = digest::build_digest_message(&reviews);
        debug!(bytes = message.len(), "publishing digest to notifier");
        notifier
            .publish_digest(&message)
            .await
            .map_err(|e| e.context("publish digest"))
    }
}
