//! Report Formatting
//!
//! Pure text rendering for the `/stats` reply and the periodic per-user
//! report, shared by the conversation engine and the report job.

use crate::session::UserId;
use crate::trade::TradeMetrics;

/// Nudge shown when a user has no logged trades yet
pub const NO_TRADES_MESSAGE: &str = "📊 No trades logged yet! Use /logtrade to get started.";

/// Render the `/stats` reply for one user's metrics.
pub fn format_stats(metrics: &TradeMetrics) -> String {
    let mut message = String::from("📊 **Your Trading Metrics**:\n\n");
    message.push_str(&format!("• Total Trades: {} 📉\n", metrics.total_trades));
    message.push_str(&format!("• Win Rate: {}% 🏆\n", metrics.win_rate));
    message.push_str(&format!("• Avg Win: ${} 🟢\n", metrics.avg_win));
    message.push_str(&format!("• Avg Loss: ${} 🔴\n", metrics.avg_loss));
    message.push_str(&format!(
        "• Risk-Reward Ratio: {}:1 ⚖️\n\n",
        metrics.risk_reward_ratio
    ));

    if let Some(coaching) = coaching_line(metrics) {
        message.push_str(coaching);
    }

    message
}

/// Render the periodic report message for one user.
pub fn format_periodic_report(user_id: &UserId, metrics: &TradeMetrics) -> String {
    let mut message = format!("🗓️ **Weekly Report for User {user_id}**:\n");
    message.push_str(&format!("• Total Trades: {}\n", metrics.total_trades));
    message.push_str(&format!("• Win Rate: {}%\n", metrics.win_rate));
    message.push_str(&format!("• Risk-Reward: {}:1\n", metrics.risk_reward_ratio));
    message
}

/// Threshold coaching: risk-reward below 1 outranks a sub-50% win rate.
fn coaching_line(metrics: &TradeMetrics) -> Option<&'static str> {
    if metrics.risk_reward_ratio < 1.0 {
        Some("⚠️ Your risk-reward ratio is below 1. Consider larger profit targets!")
    } else if metrics.win_rate < 50.0 {
        Some("💡 Low win rate? Focus on refining your entry/exit criteria.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(total: u32, win_rate: f64, rr: f64) -> TradeMetrics {
        TradeMetrics {
            total_trades: total,
            win_rate,
            avg_win: 250.0,
            avg_loss: 120.0,
            risk_reward_ratio: rr,
        }
    }

    #[test]
    fn test_stats_contains_all_metrics() {
        let message = format_stats(&metrics(12, 58.3, 2.1));
        assert!(message.contains("Total Trades: 12"));
        assert!(message.contains("Win Rate: 58.3%"));
        assert!(message.contains("Avg Win: $250"));
        assert!(message.contains("Avg Loss: $120"));
        assert!(message.contains("Risk-Reward Ratio: 2.1:1"));
    }

    #[test]
    fn test_low_risk_reward_coaching_wins() {
        let message = format_stats(&metrics(5, 30.0, 0.8));
        assert!(message.contains("risk-reward ratio is below 1"));
        assert!(!message.contains("Low win rate"));
    }

    #[test]
    fn test_low_win_rate_coaching() {
        let message = format_stats(&metrics(5, 42.0, 1.5));
        assert!(message.contains("Low win rate"));
    }

    #[test]
    fn test_periodic_report_names_user() {
        let message = format_periodic_report(&UserId::from("42"), &metrics(3, 66.7, 1.2));
        assert!(message.contains("Weekly Report for User 42"));
        assert!(message.contains("Total Trades: 3"));
    }
}
