//! Notification fan-out: the target contract, the dispatcher and the
//! built-in HTTP targets.

pub mod builder;
pub mod context;
pub mod discord;
pub mod dispatcher;
pub mod error;
pub mod global;
mod http;
pub mod ntfy;
pub mod slack;
pub mod target;
pub mod webhook;

pub use builder::targets_from_config;
pub use context::Context;
pub use discord::DiscordTarget;
pub use dispatcher::Dispatcher;
pub use error::{DispatchFailure, NotifyError, TargetFailure};
pub use ntfy::NtfyTarget;
pub use slack::SlackTarget;
pub use target::{FnTarget, NotificationTarget};
pub use webhook::{BodyFormat, Webhook, WebhookTarget};
