//! Notification adapters: an in-process queue and its delivery sinks.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use tokio::sync::mpsc;

use jumprun_core::{Notification, NotificationPort};

/// Queue-backed port. `notify` never waits on delivery.
#[derive(Debug, Clone)]
pub struct QueueNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl QueueNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationPort for QueueNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::warn!("Notification queue closed, dropping message");
        }
    }
}

/// Final delivery of a notification.
pub trait NotificationSink: Send + Sync {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>>;
}

/// Posts `{"text": ...}` to a Slack incoming webhook.
pub struct SlackWebhook {
    client: Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl NotificationSink for SlackWebhook {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let payload = serde_json::json!({ "text": notification.render() });
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .context("Failed to post to Slack")?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(anyhow::anyhow!("Slack webhook rejected message: {} {}", status, body));
            }
            tracing::debug!("Posted to Slack ({})", status);
            Ok(())
        })
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        tracing::info!("{}", notification.render());
        Box::pin(async { Ok(()) })
    }
}
