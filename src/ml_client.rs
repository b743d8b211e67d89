use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::traits::{Analyzer, Summarizer};
use crate::types::{Article, ArticleReview, Result, ScannerError};

const ML_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the external scoring/summarization service.
pub struct MlClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Serialize)]
struct RankRequest<'a> {
    title: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
}

#[derive(Deserialize)]
struct RankResponse {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    summary: String,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: String,
}

impl MlClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(ML_TIMEOUT).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }

    async fn post<T, R>(&self, path: &str, payload: &T) -> Result<R>
    where
        T: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), path);
        let mut request = self.client.post(&url).json(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::Status { url, status });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Analyzer for MlClient {
    async fn rank(&self, article: &Article) -> Result<ArticleReview> {
        let payload = RankRequest {
            title: &article.title,
            abstract_text: &article.abstract_text,
        };
        let ranked: RankResponse = self.post("/rank", &payload).await?;

        // The service may omit the summary; the abstract stands in until
        // the summarization stage runs.
        let summary = if ranked.summary.is_empty() {
            article.abstract_text.clone()
        } else {
            ranked.summary
        };

        Ok(ArticleReview {
            article: article.clone(),
            score: ranked.score,
            topics: ranked.topics,
            summary,
            ranked_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Summarizer for MlClient {
    async fn summarize(&self, article: &Article, content: &[u8]) -> Result<String> {
        let text = String::from_utf8_lossy(content);
        let payload = SummarizeRequest {
            title: &article.title,
            content: text.as_ref(),
        };
        let response: SummarizeResponse = self.post("/summarize", &payload).await?;
        Ok(response.summary)
    }
}
