//! Cancellation and deadline carrier handed to every notification target.
//!
//! A [`Context`] is cheap to clone; clones share the same cancellation state.
//! Derived contexts (`with_cancel`, `with_timeout`, `with_deadline`) are
//! cancelled together with their parent but never cancel the parent.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::notify::error::NotifyError;

#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context with no deadline that nobody else can cancel.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The effective deadline is the earlier of the parent's and `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    pub fn err(&self) -> Option<NotifyError> {
        if self.token.is_cancelled() {
            return Some(NotifyError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(NotifyError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Checkpoint for targets working through several destinations.
    pub fn check(&self) -> Result<(), NotifyError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> NotifyError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => NotifyError::Cancelled,
                    _ = sleep_until(deadline) => NotifyError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                NotifyError::Cancelled
            }
        }
    }

    /// Drives `fut` until it finishes or the context ends, whichever is first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, NotifyError>
    where
        F: Future<Output = Result<T, NotifyError>>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn cancel_propagates_to_children_only() {
        let parent = Context::background();
        let child = parent.with_cancel();

        child.cancel();
        assert!(matches!(child.err(), Some(NotifyError::Cancelled)));
        assert!(parent.err().is_none());

        let other_child = parent.with_cancel();
        parent.cancel();
        assert!(matches!(other_child.check(), Err(NotifyError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_expires_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        assert!(ctx.check().is_ok());

        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(matches!(ctx.err(), Some(NotifyError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn child_keeps_earlier_parent_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_deadline_error_for_slow_future() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));

        let result: Result<(), NotifyError> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(NotifyError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn run_passes_through_result_when_not_cancelled() {
        let ctx = Context::background();
        let value = ctx.run(async { Ok::<_, NotifyError>(7) }).await;
        assert_eq!(value.ok(), Some(7));
    }

    #[tokio::test]
    async fn done_wakes_on_cancel() {
        let ctx = Context::background();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });

        ctx.cancel();

        let err = handle.await.expect("join");
        assert!(matches!(err, NotifyError::Cancelled));
    }
}
