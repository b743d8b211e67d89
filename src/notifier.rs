use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::traits::Notifier;
use crate::types::{Result, ScannerError};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends digests to a Telegram chat through the bot API.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();
        if bot_token.is_empty() || chat_id.is_empty() {
            return Err(ScannerError::Config(
                "telegram notifier requires a bot token and chat id".to_string(),
            ));
        }

        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            bot_token,
            chat_id,
            client,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn publish_digest(&self, digest: &str) -> Result<()> {
        let endpoint = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", digest),
            ("parse_mode", "Markdown"),
        ];

        let response = self.client.post(&endpoint).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::General(format!("telegram error: {status}")));
        }

        Ok(())
    }
}
