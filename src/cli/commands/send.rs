use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Config, NotificationsConfig};
use crate::notify::{Context, Dispatcher};
use crate::telemetry::Metrics;

pub struct SendArgs<'a> {
    pub subject: &'a str,
    pub message: &'a str,
    pub timeout: Option<u64>,
}

pub async fn handle_send(
    config: &Config,
    config_path: &Path,
    args: SendArgs<'_>,
) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::from_config(&config.notifications);

    if !dispatcher.is_enabled() {
        println!("Notifications are disabled; nothing sent.");
        return Ok(());
    }
    if dispatcher.is_empty() {
        println!(
            "No notification targets configured in {}.",
            config_path.display()
        );
        return Ok(());
    }

    Metrics::set_global(Arc::new(Metrics::new()));
    let ctx = dispatch_context(&config.notifications, args.timeout);
    info!(targets = ?dispatcher.target_names(), "Sending notification");

    let result = dispatcher.send(Some(&ctx), args.subject, args.message).await;
    log_metrics();

    match result {
        Ok(()) => {
            println!("Notification sent to {} target(s).", dispatcher.len());
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            match err.dispatch_failure() {
                Some(failure) => anyhow::bail!(
                    "{} of {} targets failed",
                    failure.failed(),
                    failure.total()
                ),
                None => Err(err.into()),
            }
        }
    }
}

/// `--timeout` wins over `notifications.timeout_secs`; neither means no deadline.
fn dispatch_context(config: &NotificationsConfig, timeout: Option<u64>) -> Context {
    match timeout.or(config.timeout_secs) {
        Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    }
}

fn log_metrics() {
    let Some(metrics) = Metrics::global() else {
        return;
    };
    match metrics.encode() {
        Ok(text) => debug!(metrics = %text, "Dispatch metrics"),
        Err(err) => debug!(error = %err, "Failed to encode metrics"),
    }
}
