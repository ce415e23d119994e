//! Webhook Chat Transport
//!
//! Outbound message delivery over a plain HTTP webhook. The actual chat
//! protocol (Telegram relay, internal gateway, whatever receives the hook)
//! stays outside this process.

use std::time::Duration;

use async_trait::async_trait;

use journal_core::error::{JournalError, Result};
use journal_core::session::UserId;
use journal_core::transport::ChatTransport;

/// Webhook delivery configuration
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// URL receiving `{user_id, text}` payloads
    pub delivery_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl WebhookConfig {
    /// Read from environment. Returns `None` when `OUTBOUND_WEBHOOK_URL` is
    /// unset: outbound push is optional and the caller decides what that
    /// disables.
    pub fn from_env() -> Option<Self> {
        let delivery_url = std::env::var("OUTBOUND_WEBHOOK_URL").ok()?;
        let timeout_secs = std::env::var("OUTBOUND_WEBHOOK_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(10);

        Some(Self {
            delivery_url,
            timeout_secs,
        })
    }
}

/// Webhook-backed outbound transport
pub struct WebhookTransport {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookTransport {
    pub fn from_config(config: WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatTransport for WebhookTransport {
    async fn send_message(&self, user_id: &UserId, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.config.delivery_url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&serde_json::json!({
                "user_id": user_id.as_str(),
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JournalError::Timeout(format!("webhook delivery: {e}"))
                } else {
                    JournalError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JournalError::Transport(format!("delivery: HTTP {status}")));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
