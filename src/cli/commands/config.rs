use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context as _;

use crate::config::{Config, load_config, validate_config};

const REDACTED: &str = "********";

pub fn handle_init(force: bool, config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() && !force && !confirm_overwrite(config_path)? {
        println!("Aborted.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
        set_dir_permissions(parent);
    }

    fs::write(config_path, generate_default_config_toml())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    set_file_permissions(config_path);

    println!(
        "\x1b[32mConfig created at {}\x1b[0m",
        config_path.display()
    );
    println!("Check it with: herald config validate");

    Ok(())
}

pub fn handle_show(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = match load_config(config_path)? {
        Some(config) => config,
        None => {
            eprintln!(
                "No config file at {}. Using default configuration.",
                config_path.display()
            );
            Config::default()
        }
    };
    let config = redact_secrets(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

pub fn handle_validate(config_path: &Path) -> anyhow::Result<()> {
    let config = match load_config(config_path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            println!(
                "No config file found, will use defaults ({})",
                config_path.display()
            );
            Config::default()
        }
        Err(err) => {
            eprintln!("Configuration error: {err}");
            anyhow::bail!("configuration could not be loaded");
        }
    };

    let result = validate_config(&config);
    for warning in &result.warnings {
        println!("Warning: {}: {}", warning.field, warning.message);
    }

    if !result.is_valid() {
        eprintln!("Configuration errors:");
        for error in &result.errors {
            match &error.suggestion {
                Some(suggestion) => {
                    eprintln!("  - {}: {} ({suggestion})", error.field, error.message)
                }
                None => eprintln!("  - {}: {}", error.field, error.message),
            }
        }
        anyhow::bail!("configuration has {} error(s)", result.errors.len());
    }

    println!("Configuration valid: {}", config_path.display());
    Ok(())
}

fn redact_secrets(mut config: Config) -> Config {
    let notifications = &mut config.notifications;
    for webhook in &mut notifications.webhook {
        if webhook.secret.is_some() {
            webhook.secret = Some(REDACTED.to_string());
        }
        if let Some(headers) = &mut webhook.headers {
            for value in headers.values_mut() {
                *value = REDACTED.to_string();
            }
        }
        webhook.url = redact_query(&webhook.url);
    }
    // Slack and Discord webhook URLs carry their token in the path.
    if let Some(slack) = &mut notifications.slack {
        slack.webhook_url = redact_path(&slack.webhook_url);
    }
    if let Some(discord) = &mut notifications.discord {
        discord.webhook_url = redact_path(&discord.webhook_url);
    }
    config
}

/// Keeps scheme and host, masks everything after them.
fn redact_path(url: &str) -> String {
    let host_start = url.find("://").map_or(0, |index| index + 3);
    match url[host_start..].find('/') {
        Some(offset) if host_start + offset + 1 < url.len() => {
            format!("{}/{REDACTED}", &url[..host_start + offset])
        }
        _ => url.to_string(),
    }
}

fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, query)) if !query.is_empty() => format!("{base}?{REDACTED}"),
        _ => url.to_string(),
    }
}

fn confirm_overwrite(path: &Path) -> anyhow::Result<bool> {
    print!(
        "Config already exists at {}. Overwrite? [y/N] ",
        path.display()
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let response = input.trim();
    Ok(response.eq_ignore_ascii_case("y") || response.eq_ignore_ascii_case("yes"))
}

fn set_dir_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
            eprintln!("Warning: failed to set directory permissions: {err}");
        }
    }
}

// Webhook secrets and URLs with embedded tokens live in this file.
fn set_file_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            eprintln!("Warning: failed to set config file permissions: {err}");
        }
    }
}

pub(crate) fn generate_default_config_toml() -> String {
    r#"# herald configuration file

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "info"
# Emit JSON log lines
json = false
# Optional: also append logs to a file
# file = "/var/log/herald.log"

[notifications]
# Master switch; when false every send is a no-op
enabled = true
# Optional: deadline for a whole dispatch, in seconds
# timeout_secs = 30

# Generic webhooks (repeat the table for more receivers)
# [[notifications.webhook]]
# url = "https://your-webhook.example.com/hook"
# method = "POST"
# content_type = "application/json"  # or "text/plain"
# headers = { "Authorization" = "Bearer token" }
# secret = "shared-secret"  # adds X-Herald-Signature: sha256=<hmac>

# ntfy notifications
# [notifications.ntfy]
# topic = "your-topic"
# servers = ["https://ntfy.sh"]  # optional, default is ntfy.sh
# priority = 3  # 1 (min) to 5 (max)
# tags = ["bell"]

# Slack incoming webhook
# [notifications.slack]
# webhook_url = "https://hooks.slack.com/services/..."

# Discord webhook
# [notifications.discord]
# webhook_url = "https://discord.com/api/webhooks/..."
"#
    .to_string()
}
