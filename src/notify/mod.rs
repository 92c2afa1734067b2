//! Negotiation Notifications
//!
//! Forwards contact-form submissions to a Discord channel as an embed.
//! Delivery is best effort: one attempt, and the caller reports failure.

mod discord;

pub use discord::{DiscordConfig, DiscordWebhook};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// Embed colour for negotiation requests
pub const NEGOTIATION_COLOR: u32 = 0x00ff66;

/// Something that can deliver a webhook payload
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Deliver the payload once
    async fn send(&self, payload: &WebhookPayload) -> Result<(), NotifyError>;
}

/// Discord webhook body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline: true,
        }
    }
}

/// Build the "Negotiation Request" embed.
///
/// `quoted` is the ransom already formatted for display, `None` when the
/// system has no notice.
pub fn negotiation_embed(jcode: &str, pilot: &str, message: &str, quoted: Option<&str>) -> Embed {
    Embed {
        title: "Negotiation Request".to_string(),
        color: NEGOTIATION_COLOR,
        fields: vec![
            EmbedField::inline("J-Code", jcode),
            EmbedField::inline("Pilot", pilot),
            EmbedField::inline(
                "Quoted Amount",
                quoted.map(|q| format!("{} ISK", q)).unwrap_or_else(|| "N/A".to_string()),
            ),
        ],
        description: Some(message.to_string()),
        timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }
}

/// Errors that can occur while delivering a notification
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request timed out")]
    Timeout,

    #[error("Webhook returned HTTP {0}")]
    Status(u16),

    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
}
