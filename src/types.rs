use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article metadata discovered on a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub abstract_text: String,
    pub url: String,
    /// Site or `site/category` provenance label.
    pub source: String,
    pub published_at: DateTime<Utc>,
}

/// Scoring and enrichment attached to one article during a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleReview {
    pub article: Article,
    pub score: f64,
    pub topics: Vec<String>,
    pub summary: String,
    pub ranked_at: DateTime<Utc>,
}

impl ArticleReview {
    /// Baseline review before any enrichment collaborator has run: the
    /// abstract stands in for the summary and the score stays at zero.
    pub fn from_article(article: Article) -> Self {
        let summary = article.abstract_text.clone();
        Self {
            article,
            score: 0.0,
            topics: Vec::new(),
            summary,
            ranked_at: Utc::now(),
        }
    }
}

/// Pipeline milestones recorded with each persisted article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Fetched,
    Ranked,
    Summarized,
    Delivered,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Fetched => "fetched",
            ProcessingStatus::Ranked => "ranked",
            ProcessingStatus::Summarized => "summarized",
            ProcessingStatus::Delivered => "delivered",
        }
    }
}

/// Snapshot stored by the repository for deduplication and audit.
/// Creation and update timestamps are managed by the database.
#[derive(Debug, Clone)]
pub struct ProcessedArticle {
    pub article: Article,
    pub summary: String,
    pub score: f64,
    pub status: ProcessingStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("scanner {name} is not registered")]
    UnknownStrategy { name: String },

    #[error("no categories provided for site {site}")]
    NoCategories { site: String },

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ScannerError>,
    },
}

impl ScannerError {
    /// Wraps the error with the offending site/category/article identifier
    /// so cycle failures stay traceable to their first failing stage.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScannerError>;
