//! # Notification Sinks
//!
//! Delivery of failure and recovery signals. The log sink is always installed;
//! webhook sinks are added per `health_check.webhooks` entry. A sink that fails
//! is logged and skipped: delivery problems never reach the evaluation loop.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::notifier::{FailureNotification, NotificationKind};
use crate::config::WebhookConfig;
use crate::constants::WEBHOOK_TIMEOUT_SECONDS;
use crate::error::{HealthError, HealthResult};

/// Destination for outbound notifications
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn deliver(&self, notification: &FailureNotification) -> HealthResult<()>;
}

/// Writes notifications to the structured log
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &FailureNotification) -> HealthResult<()> {
        match notification.kind {
            NotificationKind::Failure => error!(
                probe = %notification.probe_name,
                status = %notification.status,
                previous_status = %notification.previous_status,
                description = notification.description.as_deref(),
                exception = notification.exception.as_deref(),
                "Health probe is failing"
            ),
            NotificationKind::Recovery => info!(
                probe = %notification.probe_name,
                previous_status = %notification.previous_status,
                "Health probe recovered"
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    application: &'a str,
    #[serde(flatten)]
    notification: &'a FailureNotification,
}

/// POSTs each notification as JSON to a configured URL
#[derive(Debug)]
pub struct WebhookSink {
    name: String,
    url: Url,
    application: String,
    client: Client,
}

impl WebhookSink {
    pub fn new(config: &WebhookConfig, application: impl Into<String>) -> HealthResult<Self> {
        let url = Url::parse(&config.uri).map_err(|e| {
            HealthError::ConfigurationInvalid(format!(
                "Invalid webhook URL for '{}': {}",
                config.name, e
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECONDS))
            .user_agent(format!("healthwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HealthError::NotificationError(format!("Failed to build client: {e}")))?;

        Ok(Self {
            name: config.name.clone(),
            url,
            application: application.into(),
            client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, notification: &FailureNotification) -> HealthResult<()> {
        let payload = WebhookPayload {
            application: &self.application,
            notification,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| HealthError::NotificationError(format!("{}: {}", self.name, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HealthError::NotificationError(format!(
                "{}: HTTP {}: {}",
                self.name, status, error_text
            )));
        }

        debug!(
            webhook = %self.name,
            probe = %notification.probe_name,
            kind = ?notification.kind,
            "Webhook notification delivered"
        );
        Ok(())
    }
}

/// Fans notifications out to every sink
#[derive(Debug, Clone, Default)]
pub struct NotificationDispatcher {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log sink plus one webhook sink per configured webhook
    pub fn from_webhooks(webhooks: &[WebhookConfig], application: &str) -> HealthResult<Self> {
        let mut dispatcher = Self::new().with_sink(Arc::new(LogSink));
        for webhook in webhooks {
            dispatcher = dispatcher.with_sink(Arc::new(WebhookSink::new(webhook, application)?));
        }
        Ok(dispatcher)
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver to every sink; returns the number of successful deliveries
    pub async fn dispatch(&self, notification: &FailureNotification) -> usize {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.deliver(notification).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    sink = %sink.name(),
                    probe = %notification.probe_name,
                    error = %e,
                    "Notification delivery failed"
                ),
            }
        }
        delivered
    }

    pub async fn dispatch_all(&self, notifications: &[FailureNotification]) {
        for notification in notifications {
            self.dispatch(notification).await;
        }
    }
}
