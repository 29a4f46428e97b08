//! Outbound webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::NotifyError;
use crate::format::Notification;

/// Delivers a single notification. One call per notification; the caller
/// owns pacing and never retries.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct TriggerBody<'a> {
    value1: &'a str,
    value2: &'a str,
}

/// IFTTT Maker webhook: `POST {base}/trigger/{event}/with/key/{key}` with
/// `{"value1": message, "value2": image_url}`.
pub struct IftttWebhook {
    client: Client,
    trigger_url: Url,
}

impl IftttWebhook {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the HTTP client cannot be built, or
    /// [`NotifyError::InvalidUrl`] if the trigger URL does not parse.
    pub fn new(
        base_url: &str,
        event: &str,
        key: &str,
        timeout_secs: u64,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let raw = format!(
            "{}/trigger/{event}/with/key/{key}",
            base_url.trim_end_matches('/')
        );
        // The parse error is reported without the URL since it carries the key.
        let trigger_url = Url::parse(&raw).map_err(|e| NotifyError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            trigger_url,
        })
    }
}

impl std::fmt::Debug for IftttWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IftttWebhook")
            .field("host", &self.trigger_url.host_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WebhookSender for IftttWebhook {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = TriggerBody {
            value1: &notification.message,
            value2: &notification.image_url,
        };
        let response = self
            .client
            .post(self.trigger_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
