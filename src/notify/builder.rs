use std::sync::Arc;

use tracing::warn;

use crate::config::schema::NotificationsConfig;
use crate::notify::discord::DiscordTarget;
use crate::notify::error::NotifyError;
use crate::notify::ntfy::NtfyTarget;
use crate::notify::slack::SlackTarget;
use crate::notify::target::NotificationTarget;
use crate::notify::webhook::WebhookTarget;

/// One entry per configured section. Sections whose target cannot be built
/// are logged and come back as `None`.
pub fn targets_from_config(config: &NotificationsConfig) -> Vec<Option<Arc<dyn NotificationTarget>>> {
    let mut targets = Vec::new();

    if !config.webhook.is_empty() {
        targets.push(built("webhook", WebhookTarget::from_configs(&config.webhook)));
    }
    if let Some(ntfy) = &config.ntfy {
        targets.push(built("ntfy", NtfyTarget::from_config(ntfy)));
    }
    if let Some(slack) = &config.slack {
        targets.push(Some(Arc::new(SlackTarget::from_config(slack)) as Arc<dyn NotificationTarget>));
    }
    if let Some(discord) = &config.discord {
        targets.push(Some(
            Arc::new(DiscordTarget::from_config(discord)) as Arc<dyn NotificationTarget>
        ));
    }

    targets
}

fn built<T>(section: &str, result: Result<T, NotifyError>) -> Option<Arc<dyn NotificationTarget>>
where
    T: NotificationTarget + 'static,
{
    match result {
        Ok(target) => Some(Arc::new(target)),
        Err(err) => {
            warn!(section, error = %err, "Skipping notification target that failed to build");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{NtfyConfig, SlackConfig, WebhookConfig};
    use crate::notify::dispatcher::Dispatcher;

    #[test]
    fn empty_config_builds_nothing() {
        assert!(targets_from_config(&NotificationsConfig::default()).is_empty());
    }

    #[test]
    fn broken_section_becomes_absent_and_is_skipped() {
        let mut bad_webhook = WebhookConfig::new("https://example.com");
        bad_webhook.method = Some("NOT A METHOD".to_string());
        let config = NotificationsConfig {
            webhook: vec![bad_webhook],
            ntfy: Some(NtfyConfig {
                topic: "alerts".to_string(),
                servers: Vec::new(),
                priority: None,
                tags: Vec::new(),
            }),
            slack: Some(SlackConfig {
                webhook_url: "https://hooks.slack.com/services/T/B/X".to_string(),
            }),
            ..NotificationsConfig::default()
        };

        let targets = targets_from_config(&config);
        assert_eq!(targets.len(), 3);
        assert!(targets[0].is_none());

        let dispatcher = Dispatcher::from_config(&config);
        assert_eq!(dispatcher.target_names(), vec!["ntfy", "slack"]);
        assert!(dispatcher.is_enabled());
    }

    #[test]
    fn disabled_config_disables_dispatcher() {
        let config = NotificationsConfig {
            enabled: false,
            ..NotificationsConfig::default()
        };
        assert!(!Dispatcher::from_config(&config).is_enabled());
    }
}
