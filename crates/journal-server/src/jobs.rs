//! Periodic Report Job
//!
//! Pushes each user's aggregate metrics on a fixed schedule. Runs on its own
//! task, only reads through the store, and never touches the per-message
//! conversation path.

use std::sync::Arc;
use std::time::Duration;

use journal_core::error::Result;
use journal_core::report::format_periodic_report;
use journal_core::{ChatTransport, TradeStore};

/// One week, matching the original report cadence
pub const DEFAULT_INTERVAL_SECS: u64 = 604_800;

pub fn interval_from_env() -> u64 {
    std::env::var("REPORT_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_INTERVAL_SECS)
}

/// Run the report loop forever. A failed round is logged and retried on the
/// next tick; it never takes the process down.
pub async fn run_report_loop(
    trades: Arc<dyn TradeStore>,
    transport: Arc<dyn ChatTransport>,
    interval_secs: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    // The first tick completes immediately; consume it so the first report
    // goes out one full interval after startup.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = send_reports(trades.as_ref(), transport.as_ref()).await {
            tracing::warn!(error = %e, "report round failed");
        }
    }
}

/// One report round: list users, compute metrics, push one message per user.
/// Per-user failures are logged and skipped so one bad user cannot starve
/// the rest.
async fn send_reports(trades: &dyn TradeStore, transport: &dyn ChatTransport) -> Result<()> {
    let users = trades.list_user_ids().await?;
    tracing::info!(users = users.len(), "sending periodic reports");

    for user in users {
        let metrics = match trades.compute_metrics(&user).await {
            Ok(Some(metrics)) => metrics,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "metrics unavailable, skipping");
                continue;
            }
        };

        let message = format_periodic_report(&user, &metrics);
        if let Err(e) = transport.send_message(&user, &message).await {
            tracing::warn!(user = %user, error = %e, "report delivery failed");
        }
    }

    Ok(())
}
