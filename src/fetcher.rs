use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::traits::{DocumentFetcher, Downloader};
use crate::types::{Article, Result, ScannerError};

const USER_AGENT: &str = "article-scanner/1.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP transport for listing pages.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url = %url, "requesting");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}

/// Fetches full article payloads for summarization. An article without a
/// link yields no content, which is success.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, article: &Article) -> Result<Option<Vec<u8>>> {
        if article.url.is_empty() {
            return Ok(None);
        }

        debug!(article_id = %article.id, url = %article.url, "downloading");
        let response = self.client.get(&article.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::Status {
                url: article.url.clone(),
                status,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }
}
