use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::ChatRelayConfig;
use crate::traits::ChatClient;
use crate::types::{Result, ScannerError};

const CHAT_TIMEOUT: Duration = Duration::from_secs(20);
const ERROR_BODY_LIMIT: usize = 1024;

/// Relays the serialized digest to an OpenAI-compatible chat-completions
/// endpoint as a user message.
pub struct ChatRelayClient {
    endpoint: String,
    model: String,
    api_key: String,
    system_prompt: String,
    client: Client,
}

impl ChatRelayClient {
    /// Misconfiguration is rejected eagerly rather than at send time.
    pub fn new(config: &ChatRelayConfig) -> Result<Self> {
        if config.endpoint.is_empty() || config.model.is_empty() || config.api_key.is_empty() {
            return Err(ScannerError::Config(
                "chat relay requires an endpoint, model, and api key".to_string(),
            ));
        }

        let system_prompt = match config.system_prompt.trim() {
            "" => "You are a helpful assistant that receives article digests.".to_string(),
            prompt => prompt.to_string(),
        };

        let client = Client::builder().timeout(CHAT_TIMEOUT).build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_prompt,
            client,
        })
    }
}

#[async_trait]
impl ChatClient for ChatRelayClient {
    async fn send_digest(&self, payload: &[u8]) -> Result<()> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": String::from_utf8_lossy(payload)},
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.trim().chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ScannerError::General(format!(
                "chat relay error {status}: {detail}"
            )));
        }

        Ok(())
    }
}
