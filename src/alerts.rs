use anyhow::{Result, bail};
use reqwest::Client;
use serde_json::json;
use tracing::{info, instrument};

use crate::actors::messages::{ConnectionNotification, NotificationKind};
use crate::config::Webhook;

/// Delivers connection notifications to a webhook
#[derive(Debug, Clone)]
pub struct NotificationManager {
    client: Client,
    webhook: Webhook,
    /// Name of the monitored connection, used in messages
    connection_name: String,
}

impl NotificationManager {
    pub fn new(webhook: Webhook, connection_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook,
            connection_name: connection_name.into(),
        }
    }

    pub fn format_message(&self, notification: &ConnectionNotification) -> String {
        let name = &self.connection_name;
        match (notification.event, notification.detail.as_deref()) {
            (NotificationKind::Error, Some(detail)) => {
                format!("🔴 **Connection Error**: `{name}` failed: {detail}")
            }
            (NotificationKind::Error, None) => format!("🔴 **Connection Error**: `{name}` failed"),
            (NotificationKind::Lost, _) => format!("🔴 **Connection Lost**: `{name}` is disconnected"),
            (NotificationKind::Restored, _) => {
                format!("✅ **Connection Restored**: `{name}` is back UP")
            }
        }
    }

    #[instrument(skip(self, notification), fields(event = %notification.event))]
    pub async fn send(&self, notification: &ConnectionNotification) -> Result<()> {
        let payload = json!({
            "message": self.format_message(notification),
            "connection": self.connection_name,
            "event": notification.event,
            "detail": notification.detail,
            "timestamp": notification.timestamp.to_rfc3339(),
        });

        let response = self.client.post(&self.webhook.url).json(&payload).send().await?;

        if !response.status().is_success() {
            bail!("webhook responded with status {}", response.status());
        }

        info!("Successfully sent webhook notification");
        Ok(())
    }
}
