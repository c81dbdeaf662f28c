use std::path::Path;

use reqwest::Method;

use crate::config::schema::{Config, NotificationsConfig};
use crate::notify::webhook::BodyFormat;

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

pub fn validate_config(config: &Config) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_log_level(&config.logging.level, &mut errors);
    validate_log_file(config.logging.file.as_deref(), &mut errors, &mut warnings);
    validate_notifications(&config.notifications, &mut errors, &mut warnings);

    ValidationResult { errors, warnings }
}

fn validate_notifications(
    notifications: &NotificationsConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    if notifications.timeout_secs == Some(0) {
        errors.push(ValidationError {
            field: "notifications.timeout_secs".to_string(),
            message: "Dispatch timeout must be positive".to_string(),
            suggestion: Some("Use a value of at least 1 second or remove the key".to_string()),
        });
    }

    if notifications.enabled && !notifications.has_targets() {
        warnings.push(ValidationWarning {
            field: "notifications".to_string(),
            message: "Notifications enabled but no targets configured".to_string(),
        });
    }

    for (index, webhook) in notifications.webhook.iter().enumerate() {
        let field = format!("notifications.webhook[{index}]");
        if !is_http_url(&webhook.url) {
            errors.push(ValidationError {
                field: format!("{field}.url"),
                message: "Webhook URL must start with http:// or https://".to_string(),
                suggestion: None,
            });
        }
        if let Some(ref method) = webhook.method {
            if Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).is_err() {
                errors.push(ValidationError {
                    field: format!("{field}.method"),
                    message: format!("Invalid HTTP method: {method}"),
                    suggestion: Some("Use POST, PUT or another HTTP method".to_string()),
                });
            }
        }
        if let Some(ref content_type) = webhook.content_type {
            if BodyFormat::parse(content_type).is_none() {
                errors.push(ValidationError {
                    field: format!("{field}.content_type"),
                    message: format!("Unsupported content type: {content_type}"),
                    suggestion: Some("Use application/json or text/plain".to_string()),
                });
            }
        }
        if let Some(ref secret) = webhook.secret {
            if secret.is_empty() {
                warnings.push(ValidationWarning {
                    field: format!("{field}.secret"),
                    message: "Empty signing secret; requests will not be signed".to_string(),
                });
            }
        }
    }

    if let Some(ref ntfy) = notifications.ntfy {
        if ntfy.topic.trim().is_empty() {
            errors.push(ValidationError {
                field: "notifications.ntfy.topic".to_string(),
                message: "ntfy topic cannot be empty".to_string(),
                suggestion: None,
            });
        }
        for (index, server) in ntfy.servers.iter().enumerate() {
            // Bare hosts are sent over https; only a foreign scheme is rejected.
            if server.contains("://") && !is_http_url(server) {
                errors.push(ValidationError {
                    field: format!("notifications.ntfy.servers[{index}]"),
                    message: "ntfy server must use http:// or https://".to_string(),
                    suggestion: Some(format!(
                        "Use a bare host such as \"{}\" or an http(s) URL",
                        server.split("://").nth(1).unwrap_or_default()
                    )),
                });
            }
        }
        if let Some(priority) = ntfy.priority {
            if !(1..=5).contains(&priority) {
                errors.push(ValidationError {
                    field: "notifications.ntfy.priority".to_string(),
                    message: format!("Invalid ntfy priority: {priority}"),
                    suggestion: Some("Use a priority between 1 (min) and 5 (max)".to_string()),
                });
            }
        }
    }

    if let Some(ref slack) = notifications.slack {
        if !is_http_url(&slack.webhook_url) {
            errors.push(ValidationError {
                field: "notifications.slack.webhook_url".to_string(),
                message: "Slack webhook URL must start with http:// or https://".to_string(),
                suggestion: None,
            });
        }
    }

    if let Some(ref discord) = notifications.discord {
        if !is_http_url(&discord.webhook_url) {
            errors.push(ValidationError {
                field: "notifications.discord.webhook_url".to_string(),
                message: "Discord webhook URL must start with http:// or https://".to_string(),
                suggestion: None,
            });
        }
    }
}

fn validate_log_level(level: &str, errors: &mut Vec<ValidationError>) {
    let level = level.trim().to_lowercase();
    let valid = ["trace", "debug", "info", "warn", "error"];
    if !valid.iter().any(|value| *value == level) {
        errors.push(ValidationError {
            field: "logging.level".to_string(),
            message: format!("Invalid log level: {level}"),
            suggestion: Some(format!("Valid levels: {}", valid.join(", "))),
        });
    }
}

fn validate_log_file(
    path: Option<&Path>,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let Some(path) = path else {
        return;
    };
    let field = "logging.file";

    if path.is_dir() {
        errors.push(ValidationError {
            field: field.to_string(),
            message: format!(
                "Expected a file path but found a directory: {}",
                path.display()
            ),
            suggestion: None,
        });
        return;
    }

    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() || parent.exists() => {}
        Some(parent) => warnings.push(ValidationWarning {
            field: field.to_string(),
            message: format!(
                "Parent directory does not exist yet but can be created: {}",
                parent.display()
            ),
        }),
        None => errors.push(ValidationError {
            field: field.to_string(),
            message: "Invalid file path".to_string(),
            suggestion: Some("Update the path to a valid file location".to_string()),
        }),
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value.starts_with("http://") || value.starts_with("https://")
}
