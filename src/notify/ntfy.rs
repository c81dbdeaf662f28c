use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::schema::NtfyConfig;
use crate::notify::context::Context;
use crate::notify::error::NotifyError;
use crate::notify::http::{build_client, send_checked};
use crate::notify::target::NotificationTarget;

pub const DEFAULT_SERVER: &str = "https://ntfy.sh/";

/// Publishes to one ntfy topic on every configured server.
pub struct NtfyTarget {
    topic: String,
    servers: Vec<String>,
    priority: Option<u8>,
    tags: Vec<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct NtfyPayload<'a> {
    topic: &'a str,
    title: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
}

impl NtfyTarget {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            servers: Vec::new(),
            priority: None,
            tags: Vec::new(),
            client: build_client("ntfy"),
        }
    }

    pub fn from_config(config: &NtfyConfig) -> Result<Self, NotifyError> {
        if config.topic.trim().is_empty() {
            return Err(NotifyError::Config {
                message: "ntfy topic cannot be empty".to_string(),
            });
        }
        let mut target = Self::new(config.topic.trim());
        target.add_servers(config.servers.iter().map(String::as_str));
        target.priority = config.priority;
        target.tags = config.tags.clone();
        Ok(target)
    }

    pub fn add_servers<'a, I>(&mut self, servers: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.servers
            .extend(servers.into_iter().map(normalize_server_url));
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Servers in publish order; the public ntfy.sh instance when none are set.
    pub fn servers(&self) -> Vec<&str> {
        if self.servers.is_empty() {
            vec![DEFAULT_SERVER]
        } else {
            self.servers.iter().map(String::as_str).collect()
        }
    }
}

#[async_trait]
impl NotificationTarget for NtfyTarget {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn send(&self, ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError> {
        let payload = NtfyPayload {
            topic: &self.topic,
            title: subject,
            message,
            priority: self.priority,
            tags: &self.tags,
        };

        for server in self.servers() {
            ctx.check()?;
            let request = self.client.post(server).json(&payload);
            send_checked(ctx, request, server).await?;
            debug!(server, topic = %self.topic, "ntfy notification sent");
        }
        Ok(())
    }
}

/// Prefixes `https://` when no scheme is given and ensures a trailing slash.
fn normalize_server_url(server: &str) -> String {
    let server = server.trim();
    if server.is_empty() {
        return DEFAULT_SERVER.to_string();
    }

    let mut url = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{server}")
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
