use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for herald.
///
/// Example:
/// ```toml
/// [logging]
/// level = "info"
///
/// [notifications]
/// enabled = true
///
/// [notifications.slack]
/// webhook_url = "https://hooks.slack.com/services/..."
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration section.
    /// Example: [logging]
    pub logging: LoggingConfig,
    /// Notification target configuration section.
    /// Example: [notifications]
    pub notifications: NotificationsConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    /// Example: level = "info"
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    /// Example: json = false
    pub json: bool,
    /// Optional log file, appended to.
    /// Example: file = "/var/log/herald.log"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Notification target configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Kill-switch for every send.
    /// Example: enabled = true
    pub enabled: bool,
    /// Deadline applied to each send (seconds).
    /// Example: timeout_secs = 30
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Generic webhook receivers, all served by one target.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub webhook: Vec<WebhookConfig>,
    /// ntfy notification configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntfy: Option<NtfyConfig>,
    /// Slack notification configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
    /// Discord notification configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordConfig>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: None,
            webhook: Vec::new(),
            ntfy: None,
            slack: None,
            discord: None,
        }
    }
}

impl NotificationsConfig {
    pub fn has_targets(&self) -> bool {
        !self.webhook.is_empty()
            || self.ntfy.is_some()
            || self.slack.is_some()
            || self.discord.is_some()
    }
}

/// A single webhook receiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookConfig {
    /// Receiver URL.
    /// Example: url = "https://example.com/hooks"
    pub url: String,
    /// HTTP method (default: POST).
    /// Example: method = "PUT"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Body encoding: "application/json" (default) or "text/plain".
    /// Example: content_type = "text/plain"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Optional custom headers.
    /// Example: headers = { Authorization = "Bearer token" }
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Optional HMAC-SHA256 signing secret.
    /// Example: secret = "s3cr3t"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            content_type: None,
            headers: None,
            secret: None,
        }
    }
}

/// ntfy notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NtfyConfig {
    /// ntfy topic name.
    /// Example: topic = "alerts"
    pub topic: String,
    /// ntfy servers to publish to (default: ntfy.sh).
    /// Example: servers = ["https://ntfy.sh"]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<String>,
    /// Message priority, 1 (min) to 5 (max).
    /// Example: priority = 4
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Tags or emoji shortcodes.
    /// Example: tags = ["warning"]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Slack webhook notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlackConfig {
    /// Slack webhook URL.
    /// Example: webhook_url = "https://hooks.slack.com/services/..."
    pub webhook_url: String,
}

/// Discord webhook notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordConfig {
    /// Discord webhook URL.
    /// Example: webhook_url = "https://discord.com/api/webhooks/..."
    pub webhook_url: String,
}
