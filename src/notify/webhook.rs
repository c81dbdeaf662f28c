use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::schema::WebhookConfig;
use crate::notify::context::Context;
use crate::notify::error::NotifyError;
use crate::notify::http::{build_client, check_status, send_request};
use crate::notify::target::NotificationTarget;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Herald-Signature";
const SIGNATURE_PREFIX: &str = "sha256=";

/// Builds the request body from subject and message, replacing the
/// receiver's [`BodyFormat`] encoding.
pub type PayloadBuilder = Arc<dyn Fn(&str, &str) -> Result<Vec<u8>, NotifyError> + Send + Sync>;

/// Runs on every outgoing request, after headers and signature are set.
pub type PreSendHook =
    Arc<dyn Fn(RequestBuilder) -> Result<RequestBuilder, NotifyError> + Send + Sync>;

/// Runs on every response before its status is checked.
pub type PostSendHook = Arc<dyn Fn(&Response) -> Result<(), NotifyError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    PlainText,
}

impl BodyFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "application/json" => Some(Self::Json),
            "text/plain" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain",
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

/// One HTTP endpoint receiving notifications.
#[derive(Clone)]
pub struct Webhook {
    url: String,
    method: Method,
    format: BodyFormat,
    headers: HeaderMap,
    secret: Option<String>,
    payload_builder: Option<PayloadBuilder>,
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Webhook")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("format", &self.format)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("signed", &self.secret.is_some())
            .field("custom_payload", &self.payload_builder.is_some())
            .finish()
    }
}

impl Webhook {
    /// A JSON `POST` receiver.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            format: BodyFormat::Json,
            headers: HeaderMap::new(),
            secret: None,
            payload_builder: None,
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, NotifyError> {
        let mut webhook = Self::new(config.url.clone());

        if let Some(method) = &config.method {
            webhook.method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| NotifyError::Config {
                    message: format!("invalid webhook method {method:?}"),
                })?;
        }
        if let Some(content_type) = &config.content_type {
            webhook.format = BodyFormat::parse(content_type).ok_or_else(|| NotifyError::Config {
                message: format!("unsupported webhook content type {content_type:?}"),
            })?;
        }
        if let Some(headers) = &config.headers {
            for (key, value) in headers {
                webhook = webhook.with_header(key, value);
            }
        }
        if let Some(secret) = &config.secret {
            webhook = webhook.with_secret(secret.as_str());
        }
        Ok(webhook)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_format(mut self, format: BodyFormat) -> Self {
        self.format = format;
        self
    }

    /// Adds a header; invalid names or values are skipped.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                warn!(header = %key, "Invalid webhook header; skipping");
            }
        }
        self
    }

    /// Signs each request body. An empty secret leaves requests unsigned.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.secret = (!secret.is_empty()).then_some(secret);
        self
    }

    pub fn with_payload_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<Vec<u8>, NotifyError> + Send + Sync + 'static,
    {
        self.payload_builder = Some(Arc::new(builder));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn body(&self, subject: &str, message: &str) -> Result<Vec<u8>, NotifyError> {
        if let Some(builder) = &self.payload_builder {
            return builder(subject, message);
        }
        match self.format {
            BodyFormat::Json => serde_json::to_vec(&WebhookPayload { subject, message })
                .map_err(|err| NotifyError::send_failed(format!("encode webhook payload: {err}"))),
            BodyFormat::PlainText => Ok(format!("{subject}\n\n{message}").into_bytes()),
        }
    }
}

/// Delivers to a list of webhooks, in order. Fails on the first receiver
/// that fails.
pub struct WebhookTarget {
    receivers: Vec<Webhook>,
    client: Client,
    pre_send: Vec<PreSendHook>,
    post_send: Vec<PostSendHook>,
}

impl Default for WebhookTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookTarget {
    pub fn new() -> Self {
        Self {
            receivers: Vec::new(),
            client: build_client("webhook"),
            pre_send: Vec::new(),
            post_send: Vec::new(),
        }
    }

    pub fn from_configs(configs: &[WebhookConfig]) -> Result<Self, NotifyError> {
        let mut target = Self::new();
        for config in configs {
            target.add_receiver(Webhook::from_config(config)?);
        }
        Ok(target)
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Adds a hook run on every request, in registration order. An error
    /// fails the receiver without sending.
    pub fn pre_send<F>(&mut self, hook: F)
    where
        F: Fn(RequestBuilder) -> Result<RequestBuilder, NotifyError> + Send + Sync + 'static,
    {
        self.pre_send.push(Arc::new(hook));
    }

    /// Adds a hook run on every response, in registration order. An error
    /// fails the receiver even on a 2xx status.
    pub fn post_send<F>(&mut self, hook: F)
    where
        F: Fn(&Response) -> Result<(), NotifyError> + Send + Sync + 'static,
    {
        self.post_send.push(Arc::new(hook));
    }

    pub fn add_receiver(&mut self, webhook: Webhook) {
        self.receivers.push(webhook);
    }

    pub fn add_receiver_urls<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.receivers
            .extend(urls.into_iter().map(Webhook::new));
    }

    pub fn receivers(&self) -> &[Webhook] {
        &self.receivers
    }

    async fn send_to(
        &self,
        ctx: &Context,
        webhook: &Webhook,
        subject: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        let body = webhook.body(subject, message)?;
        let mut request = self
            .client
            .request(webhook.method.clone(), &webhook.url)
            .header(CONTENT_TYPE, webhook.format.content_type())
            .headers(webhook.headers.clone());
        if let Some(secret) = &webhook.secret {
            request = request.header(SIGNATURE_HEADER, sign(secret, &body)?);
        }
        request = request.body(body);
        for hook in &self.pre_send {
            request = hook(request).map_err(|err| {
                NotifyError::send_failed(format!("{}: pre-send hook: {err}", webhook.url))
            })?;
        }

        let response = send_request(ctx, request, &webhook.url).await?;
        for hook in &self.post_send {
            hook(&response).map_err(|err| {
                NotifyError::send_failed(format!("{}: post-send hook: {err}", webhook.url))
            })?;
        }
        check_status(response, &webhook.url).await?;
        debug!(url = %webhook.url, "Webhook notification sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationTarget for WebhookTarget {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, ctx: &Context, subject: &str, message: &str) -> Result<(), NotifyError> {
        for webhook in &self.receivers {
            ctx.check()?;
            self.send_to(ctx, webhook, subject, message).await?;
        }
        Ok(())
    }
}

/// `sha256=<hex>` HMAC of the request body.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, NotifyError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| NotifyError::Config {
        message: "invalid webhook signing secret".to_string(),
    })?;
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}
