//! Process-wide default dispatcher for one-line sends.
//!
//! Sends run against a snapshot of the shared dispatcher, so registering
//! targets concurrently with a send only affects later sends.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::notify::context::Context;
use crate::notify::dispatcher::Dispatcher;
use crate::notify::error::NotifyError;
use crate::notify::target::NotificationTarget;

static DEFAULT: LazyLock<RwLock<Dispatcher>> = LazyLock::new(|| RwLock::new(Dispatcher::new()));

/// A clone of the shared dispatcher.
pub fn default_dispatcher() -> Dispatcher {
    DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn add_targets<I, T>(targets: I)
where
    I: IntoIterator<Item = T>,
    T: Into<Option<Arc<dyn NotificationTarget>>>,
{
    DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add_targets(targets);
}

pub fn set_enabled(enabled: bool) {
    DEFAULT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .set_enabled(enabled);
}

pub fn is_enabled() -> bool {
    DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_enabled()
}

pub async fn send(ctx: Option<&Context>, subject: &str, message: &str) -> Result<(), NotifyError> {
    default_dispatcher().send(ctx, subject, message).await
}
