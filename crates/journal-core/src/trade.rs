//! Trade Records & Persistence Interface
//!
//! The single record shape the conversation produces, the aggregate metrics
//! shape the store computes, and the store trait both sides talk through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{JournalError, Result};
use crate::sentiment::Sentiment;
use crate::session::UserId;

/// Chart provider expected in every trade link
pub const CHART_DOMAIN: &str = "tradingview.com";

/// One logged trade, written exactly once per completed conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Record identifier
    pub id: Uuid,

    /// Owning user
    pub user_id: UserId,

    /// Chart link captured at the start of the conversation
    pub trade_link: String,

    /// Signed profit/loss in the user's currency units
    pub outcome: i64,

    /// Trader-vocabulary sentiment from the reflection turn
    pub sentiment: Sentiment,

    /// Raw free text of the reflection turn
    pub notes: String,

    /// Server-assigned timestamp
    pub logged_at: DateTime<Utc>,
}

impl TradeRecord {
    pub fn new(
        user_id: UserId,
        trade_link: impl Into<String>,
        outcome: i64,
        sentiment: Sentiment,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            trade_link: trade_link.into(),
            outcome,
            sentiment,
            notes: notes.into(),
            logged_at: Utc::now(),
        }
    }
}

/// Aggregate performance metrics, computed server-side by the store
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TradeMetrics {
    #[serde(default)]
    pub total_trades: u32,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub avg_win: f64,
    #[serde(default)]
    pub avg_loss: f64,
    #[serde(default)]
    pub risk_reward_ratio: f64,
}

/// Validate a candidate trade link.
///
/// A link is valid iff it uses the secure transport scheme and references
/// the chart provider domain (case-insensitive). Anything else is treated
/// as ordinary conversation, never as an implicit link.
pub fn validate_trade_link(candidate: &str) -> Result<&str> {
    let trimmed = candidate.trim();
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with("https://") && lowered.contains(CHART_DOMAIN) {
        Ok(trimmed)
    } else {
        Err(JournalError::InvalidLink(trimmed.to_string()))
    }
}

/// Persistence store trait (Strategy pattern)
///
/// Implement this for each backend: Supabase, Postgres, a test double, etc.
/// The metrics aggregation itself stays opaque to this core.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Insert one trade record. Exactly one attempt per commit.
    async fn insert_trade(&self, record: &TradeRecord) -> Result<()>;

    /// Distinct users with at least one logged trade (periodic report path).
    async fn list_user_ids(&self) -> Result<Vec<UserId>>;

    /// Server-side aggregate metrics for a user, `None` when absent.
    async fn compute_metrics(&self, user_id: &UserId) -> Result<Option<TradeMetrics>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> bool;

    /// Store name, for logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_link() {
        assert!(validate_trade_link("https://tradingview.com/chart/abc").is_ok());
        assert!(validate_trade_link("https://www.TradingView.com/chart/XYZ").is_ok());
        assert!(validate_trade_link("  https://tradingview.com/chart/abc  ").is_ok());
    }

    #[test]
    fn test_insecure_scheme_rejected() {
        assert!(validate_trade_link("http://tradingview.com/chart/abc").is_err());
        assert!(validate_trade_link("ftp://tradingview.com/chart/abc").is_err());
    }

    #[test]
    fn test_wrong_domain_rejected() {
        assert!(validate_trade_link("https://example.com/chart/abc").is_err());
        assert!(validate_trade_link("just some text").is_err());
    }
}
