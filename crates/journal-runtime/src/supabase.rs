//! Supabase Trade Store
//!
//! Implementation of `TradeStore` against the Supabase PostgREST API.
//! Metrics aggregation stays server-side in the `calculate_metrics` stored
//! procedure; this client only ships rows and invokes the RPC.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use journal_core::error::{JournalError, Result};
use journal_core::session::UserId;
use journal_core::trade::{TradeMetrics, TradeRecord, TradeStore};

/// Supabase connection configuration
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`
    pub url: String,

    /// Service or anon API key
    pub key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl SupabaseConfig {
    /// Read from environment. Both `SUPABASE_URL` and `SUPABASE_KEY` are
    /// required; a missing one is a startup-fatal configuration error.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| JournalError::Config("SUPABASE_URL is not set".into()))?;
        let key = std::env::var("SUPABASE_KEY")
            .map_err(|_| JournalError::Config("SUPABASE_KEY is not set".into()))?;
        let timeout_secs = std::env::var("SUPABASE_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            url,
            key,
            timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserIdRow {
    user_id: String,
}

/// Supabase-backed trade store
pub struct SupabaseStore {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseStore {
    pub fn from_config(config: SupabaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(SupabaseConfig::from_env()?))
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
    }

    fn map_send_error(e: reqwest::Error) -> JournalError {
        if e.is_timeout() {
            JournalError::Timeout(format!("supabase request: {e}"))
        } else {
            JournalError::Storage(e.to_string())
        }
    }
}

/// Deduplicate user ids preserving first-seen order.
fn distinct_user_ids(rows: Vec<UserIdRow>) -> Vec<UserId> {
    let mut seen = std::collections::HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.user_id.clone()))
        .map(|row| UserId::from_string(row.user_id))
        .collect()
}

#[async_trait]
impl TradeStore for SupabaseStore {
    async fn insert_trade(&self, record: &TradeRecord) -> Result<()> {
        let response = self
            .request(self.client.post(self.rest_url("trades")))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JournalError::Storage(format!(
                "insert rejected: HTTP {status}: {body}"
            )));
        }

        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>> {
        let response = self
            .request(
                self.client
                    .get(self.rest_url("trades"))
                    .query(&[("select", "user_id")]),
            )
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(JournalError::Storage(format!("user listing: HTTP {status}")));
        }

        let rows: Vec<UserIdRow> = response
            .json()
            .await
            .map_err(|e| JournalError::Storage(format!("malformed user listing: {e}")))?;

        Ok(distinct_user_ids(rows))
    }

    async fn compute_metrics(&self, user_id: &UserId) -> Result<Option<TradeMetrics>> {
        let response = self
            .request(self.client.post(self.rest_url("rpc/calculate_metrics")))
            .json(&serde_json::json!({ "input_user_id": user_id.as_str() }))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(JournalError::Storage(format!("metrics rpc: HTTP {status}")));
        }

        let rows: Vec<TradeMetrics> = response
            .json()
            .await
            .map_err(|e| JournalError::Storage(format!("malformed metrics payload: {e}")))?;

        Ok(rows.into_iter().next())
    }

    async fn health_check(&self) -> bool {
        let probe = self
            .request(self.client.get(self.rest_url("")))
            .send()
            .await;

        match probe {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Supabase health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "supabase"
    }
}
