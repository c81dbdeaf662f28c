use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::schema::SlackConfig;
use crate::notify::context::Context;
use crate::notify::error::NotifyError;
use crate::notify::http::{build_client, send_checked};
use crate::notify::target::NotificationTarget;

// Slack rejects header blocks longer than this.
const HEADER_MAX_CHARS: usize = 150;

pub struct SlackTarget {
    webhook_url: String,
    client: Client,
}

impl SlackTarget {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: build_client("slack"),
        }
    }

    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.webhook_url.clone())
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl NotificationTarget for SlackTarget {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError> {
        let payload = build_payload(subject, message);
        let request = self.client.post(&self.webhook_url).json(&payload);

        send_checked(ctx, request, "slack").await?;

        debug!(subject, "Slack notification sent");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SlackWebhookPayload {
    text: String,
    blocks: Vec<SlackBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum SlackBlock {
    #[serde(rename = "header")]
    Header { text: SlackText },
    #[serde(rename = "section")]
    Section { text: SlackText },
}

#[derive(Debug, Serialize)]
struct SlackText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

fn build_payload(subject: &str, message: &str) -> SlackWebhookPayload {
    let mut blocks = Vec::with_capacity(2);
    if !subject.is_empty() {
        blocks.push(SlackBlock::Header {
            text: SlackText {
                text_type: "plain_text",
                text: subject.chars().take(HEADER_MAX_CHARS).collect(),
            },
        });
    }
    if !message.is_empty() {
        blocks.push(SlackBlock::Section {
            text: SlackText {
                text_type: "mrkdwn",
                text: message.to_string(),
            },
        });
    }

    // `text` is the fallback used in push notifications.
    SlackWebhookPayload {
        text: subject.to_string(),
        blocks,
    }
}
