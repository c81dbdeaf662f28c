use std::future::Future;

use async_trait::async_trait;

use crate::notify::context::Context;
use crate::notify::error::NotifyError;

/// A backend that can attempt delivery of a subject and message.
///
/// Implementations that deliver to several destinations should call
/// [`Context::check`] between them and fail if any destination fails.
#[async_trait]
pub trait NotificationTarget: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError>;
}

/// Wraps a closure as a [`NotificationTarget`].
pub struct FnTarget<F> {
    name: String,
    send_fn: F,
}

impl<F, Fut> FnTarget<F>
where
    F: Fn(Context, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, send_fn: F) -> Self {
        Self {
            name: name.into(),
            send_fn,
        }
    }
}

#[async_trait]
impl<F, Fut> NotificationTarget for FnTarget<F>
where
    F: Fn(Context, String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError> {
        (self.send_fn)(ctx.clone(), subject.to_string(), message.to_string()).await
    }
}
