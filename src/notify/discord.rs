//! Discord webhook client

use super::{Notifier, NotifyError, WebhookPayload};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Discord webhook settings
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Full webhook URL including the token
    pub webhook_url: String,
    /// Display name for the bot
    pub username: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            username: "SALT MINER WOOOO".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Posts payloads to a Discord webhook
pub struct DiscordWebhook {
    client: Client,
    config: DiscordConfig,
}

impl DiscordWebhook {
    pub fn new(config: DiscordConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Bot display name to put on payloads
    pub fn username(&self) -> &str {
        &self.config.username
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, payload: &WebhookPayload) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Request(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Webhook delivered");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Webhook rejected");
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}
