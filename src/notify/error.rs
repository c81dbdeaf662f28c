use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification send failed: {message}")]
    SendFailed { message: String },
    #[error("context canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    #[error("notification configuration error: {message}")]
    Config { message: String },
    #[error("target panicked: {message}")]
    TargetPanicked { message: String },
    /// Sentinel for a dispatch where at least one target failed.
    #[error("send notification: {0}")]
    SendNotification(DispatchFailure),
}

impl NotifyError {
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    pub fn is_send_notification(&self) -> bool {
        matches!(self, Self::SendNotification(_))
    }

    /// True for the two terminal context errors.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    pub fn dispatch_failure(&self) -> Option<&DispatchFailure> {
        match self {
            Self::SendNotification(failure) => Some(failure),
            _ => None,
        }
    }
}

/// One target's failed attempt within a dispatch.
#[derive(Debug)]
pub struct TargetFailure {
    pub target: String,
    pub error: NotifyError,
}

/// Every failure collected from one dispatch, in completion order.
#[derive(Debug)]
pub struct DispatchFailure {
    total: usize,
    failures: Vec<TargetFailure>,
}

impl DispatchFailure {
    pub(crate) fn new(total: usize, failures: Vec<TargetFailure>) -> Self {
        Self { total, failures }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.total.saturating_sub(self.failures.len())
    }

    pub fn failures(&self) -> &[TargetFailure] {
        &self.failures
    }

    pub fn failed_targets(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|failure| failure.target.as_str())
            .collect()
    }
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} targets failed", self.failed(), self.total)?;
        for failure in &self.failures {
            write!(f, "\n{}: {}", failure.target, failure.error)?;
        }
        Ok(())
    }
}
