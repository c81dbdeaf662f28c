//! Configuration management module.

pub mod load;
pub mod paths;
pub mod schema;
pub mod validation;

pub use load::{ConfigError, load_config, load_config_or_default};
pub use paths::{CONFIG_ENV, Paths};
pub use schema::{
    Config, DiscordConfig, LoggingConfig, NotificationsConfig, NtfyConfig, SlackConfig,
    WebhookConfig,
};
pub use validation::{ValidationError, ValidationResult, ValidationWarning, validate_config};
