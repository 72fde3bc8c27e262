// Chat incoming-webhook client (Slack-compatible `{"text": ...}` payload)

use super::ChatWebhook;
use crate::errors::DeliveryError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct SlackWebhook {
    client: Client,
    webhook_url: String,
}

impl SlackWebhook {
    /// Create a new webhook client with the specified timeout
    pub fn new(webhook_url: impl Into<String>, timeout_seconds: u64) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| DeliveryError::Webhook(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// Post a connectivity check message and return the HTTP status
    pub async fn send_test_message(&self) -> Result<u16, DeliveryError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "text": "Chat webhook test successful" }))
            .send()
            .await
            .map_err(|e| DeliveryError::Webhook(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl ChatWebhook for SlackWebhook {
    #[instrument(skip(self, text))]
    async fn post_text(&self, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| DeliveryError::Webhook(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::WebhookStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Webhook accepted message");
        Ok(())
    }
}
