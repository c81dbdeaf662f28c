//! Shared HTTP plumbing for the built-in targets.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use tracing::warn;

use crate::notify::context::Context;
use crate::notify::error::NotifyError;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_client(target: &str) -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|err| {
            warn!(target_name = target, error = %err, "Failed to build HTTP client; using defaults");
            Client::new()
        })
}

/// Sends `request` under `ctx` and fails on any non-2xx status.
pub(crate) async fn send_checked(
    ctx: &Context,
    request: RequestBuilder,
    destination: &str,
) -> Result<Response, NotifyError> {
    let response = send_request(ctx, request, destination).await?;
    check_status(response, destination).await
}

pub(crate) async fn send_request(
    ctx: &Context,
    request: RequestBuilder,
    destination: &str,
) -> Result<Response, NotifyError> {
    ctx.run(async {
        request.send().await.map_err(|err| {
            NotifyError::send_failed(format!("{destination}: request error: {err}"))
        })
    })
    .await
}

pub(crate) async fn check_status(
    response: Response,
    destination: &str,
) -> Result<Response, NotifyError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NotifyError::send_failed(format!(
            "{destination}: unexpected status {status}: {}",
            body.trim()
        )));
    }
    Ok(response)
}
