use crate::error::NotifierError;
use async_trait::async_trait;
use configuration::NotifierConfig;
use core_types::{Bin, Report};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
pub mod error;

/// What a notifier is told when a report is filed against a bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportNotification {
    pub bin_id: i32,
    pub location: String,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ReportNotification {
    pub fn new(bin: &Bin, report: &Report) -> Self {
        Self {
            bin_id: bin.id,
            location: bin.location.clone(),
            status: report.status.clone(),
            latitude: bin.latitude,
            longitude: bin.longitude,
        }
    }
}

/// A replaceable delivery channel for report notifications.
///
/// Handlers only see this trait, so a deployment can swap the log-only default for
/// real delivery without touching request handling.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &ReportNotification) -> Result<(), NotifierError>;
}

/// The default notifier: writes one structured log line per report.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &ReportNotification) -> Result<(), NotifierError> {
        tracing::info!(
            bin_id = event.bin_id,
            location = %event.location,
            status = %event.status,
            latitude = ?event.latitude,
            longitude = ?event.longitude,
            "Notification: bin at {} reported {}.",
            event.location,
            event.status
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a fixed URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifierError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &ReportNotification) -> Result<(), NotifierError> {
        let response = self.client.post(&self.url).json(event).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(NotifierError::ApiError(format!("{status}: {error_text}")));
        }

        tracing::debug!(bin_id = event.bin_id, url = %self.url, "Webhook notification delivered.");
        Ok(())
    }
}

/// Picks the notifier for the given configuration: the webhook when a URL is set,
/// the log-only notifier otherwise.
pub fn from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifierError> {
    match config.webhook_url() {
        Some(url) => {
            tracing::info!(url, "Report notifications will be sent to a webhook.");
            Ok(Arc::new(WebhookNotifier::new(url, config.timeout())?))
        }
        None => {
            tracing::info!("No webhook configured; report notifications are logged only.");
            Ok(Arc::new(LogNotifier))
        }
    }
}
