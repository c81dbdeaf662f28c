use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, error, info_span, instrument, warn};

use crate::config::schema::NotificationsConfig;
use crate::notify::builder::targets_from_config;
use crate::notify::context::Context;
use crate::notify::error::{DispatchFailure, NotifyError, TargetFailure};
use crate::notify::target::NotificationTarget;
use crate::telemetry::metrics::{Metrics, SendOutcome};

/// Fans a subject and message out to every registered target.
///
/// Targets run concurrently and every one of them runs to completion; a
/// failing or panicking target never prevents the others from being tried.
#[derive(Clone)]
pub struct Dispatcher {
    enabled: bool,
    targets: Vec<Arc<dyn NotificationTarget>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("enabled", &self.enabled)
            .field("targets", &self.target_names())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            enabled: true,
            targets: Vec::new(),
        }
    }

    pub fn with_targets<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Arc<dyn NotificationTarget>>>,
    {
        let mut dispatcher = Self::new();
        dispatcher.add_targets(targets);
        dispatcher
    }

    /// Builds the targets described by `config`. Targets that fail to
    /// construct are logged and left out.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let mut dispatcher = Self::with_targets(targets_from_config(config));
        dispatcher.set_enabled(config.enabled);
        dispatcher
    }

    /// Appends targets in order. Absent entries are skipped.
    pub fn add_targets<I, T>(&mut self, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Arc<dyn NotificationTarget>>>,
    {
        self.targets
            .extend(targets.into_iter().filter_map(Into::into));
    }

    pub fn add_target<N>(&mut self, target: N)
    where
        N: NotificationTarget + 'static,
    {
        self.targets.push(Arc::new(target));
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enable(&mut self) {
        self.set_enabled(true);
    }

    pub fn disable(&mut self) {
        self.set_enabled(false);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|target| target.name()).collect()
    }

    /// Sends to every target and waits for all of them.
    ///
    /// Returns `Ok(())` when the dispatcher is disabled, has no targets, or
    /// every target succeeded. Otherwise returns
    /// [`NotifyError::SendNotification`] listing each failure in the order the
    /// targets finished. A missing `ctx` is replaced by
    /// [`Context::background`].
    #[instrument(
        skip_all,
        fields(dispatch_id = %uuid::Uuid::new_v4(), targets = self.targets.len())
    )]
    pub async fn send(
        &self,
        ctx: Option<&Context>,
        subject: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        if !self.enabled {
            debug!("Dispatcher disabled; skipping send");
            return Ok(());
        }
        if self.targets.is_empty() {
            return Ok(());
        }

        let ctx = ctx.cloned().unwrap_or_default();
        let subject: Arc<str> = Arc::from(subject);
        let message: Arc<str> = Arc::from(message);
        let metrics = Metrics::global();
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(self.targets.len());
        for target in &self.targets {
            let name = target.name().to_string();
            let target = Arc::clone(target);
            let ctx = ctx.clone();
            let subject = Arc::clone(&subject);
            let message = Arc::clone(&message);
            // Created inside the send span, so target logs carry the dispatch id.
            let span = info_span!("target", target_name = %name);
            let handle = tasks.spawn(
                async move { target.send(&ctx, &subject, &message).await }.instrument(span),
            );
            names.insert(handle.id(), name);
        }

        let total = names.len();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result, outcome) = match joined {
                Ok((id, Ok(()))) => (id, Ok(()), SendOutcome::Success),
                Ok((id, Err(err))) => (id, Err(err), SendOutcome::Failure),
                Err(join_err) => {
                    let outcome = if join_err.is_panic() {
                        SendOutcome::Panic
                    } else {
                        SendOutcome::Failure
                    };
                    (join_err.id(), Err(join_error_to_notify(join_err)), outcome)
                }
            };
            let target = names
                .remove(&id)
                .unwrap_or_else(|| "unknown".to_string());

            if let Some(metrics) = &metrics {
                metrics.record_target_send(&target, outcome);
            }

            match result {
                Ok(()) => debug!(target_name = %target, "Notification target send succeeded"),
                Err(error) => {
                    error!(
                        target_name = %target,
                        error = %error,
                        "Notification target send failed"
                    );
                    failures.push(TargetFailure { target, error });
                }
            }
        }

        if let Some(metrics) = &metrics {
            metrics.record_dispatch(started.elapsed(), failures.is_empty());
        }

        if failures.is_empty() {
            debug!(total, "Notification dispatched to all targets");
            return Ok(());
        }

        warn!(
            total,
            failed = failures.len(),
            "Notification dispatch finished with failures"
        );
        Err(NotifyError::SendNotification(DispatchFailure::new(
            total, failures,
        )))
    }
}

fn join_error_to_notify(err: JoinError) -> NotifyError {
    if err.is_panic() {
        NotifyError::TargetPanicked {
            message: panic_message(err.into_panic()),
        }
    } else {
        NotifyError::send_failed(format!("target task aborted: {err}"))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(err) = payload.downcast_ref::<NotifyError>() {
        err.to_string()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
