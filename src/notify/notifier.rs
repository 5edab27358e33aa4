//! Notification delivery backends

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Delivers a human-facing notification to an actor
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Writes notifications to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(to = %to, subject = %subject, "{}", body);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// POSTs notifications as JSON to a mail relay or webhook endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Notification(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { to, subject, body })
            .send()
            .await
            .map_err(|e| Error::Notification(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notification(format!(
                "Webhook returned {}",
                status
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
