use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::schema::DiscordConfig;
use crate::notify::context::Context;
use crate::notify::error::NotifyError;
use crate::notify::http::{build_client, send_checked};
use crate::notify::target::NotificationTarget;

const TITLE_MAX_CHARS: usize = 256;
const DESCRIPTION_MAX_CHARS: usize = 4096;
const EMBED_COLOR: u32 = 0x5865F2;

pub struct DiscordTarget {
    webhook_url: String,
    client: Client,
}

impl DiscordTarget {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: build_client("discord"),
        }
    }

    pub fn from_config(config: &DiscordConfig) -> Self {
        Self::new(config.webhook_url.clone())
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl NotificationTarget for DiscordTarget {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError> {
        let payload = build_payload(subject, message, Utc::now());
        let request = self.client.post(&self.webhook_url).json(&payload);

        send_checked(ctx, request, "discord").await?;

        debug!(subject, "Discord notification sent");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct DiscordWebhookPayload {
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
}

fn build_payload(subject: &str, message: &str, now: DateTime<Utc>) -> DiscordWebhookPayload {
    DiscordWebhookPayload {
        embeds: vec![DiscordEmbed {
            title: subject.chars().take(TITLE_MAX_CHARS).collect(),
            description: message.chars().take(DESCRIPTION_MAX_CHARS).collect(),
            color: EMBED_COLOR,
            timestamp: now.to_rfc3339(),
        }],
    }
}
