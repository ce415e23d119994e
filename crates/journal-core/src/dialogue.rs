//! Conversation Engine
//!
//! The per-user trade-logging state machine. Sequences link capture, outcome
//! capture, and the emotional reflection, then commits exactly one
//! [`TradeRecord`]. The chat transport delivers one user's messages serially;
//! a per-user lock below enforces the same guarantee against retried or
//! duplicated deliveries.
//!
//! No internal error escapes [`DialogueEngine::handle`]: failures become a
//! user-visible reply plus an operator log line, so one user's bad turn can
//! never corrupt another user's session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{JournalError, Result};
use crate::outcome::parse_outcome;
use crate::report;
use crate::sentiment::SentimentAnalyzer;
use crate::session::{Phase, SessionStore, UserId};
use crate::trade::{TradeRecord, TradeStore, validate_trade_link};

const GREETING: &str = "Hey there, trader! 📊 Let's track your progress.\n\n\
Use /logtrade [TradingView link] to start logging.\n\
Need help? Just ask: 'How do I log a trade?'";

const OUTCOME_PROMPT: &str = "Alright, let's break this down 🧠\n\
What was the outcome? You can say:\n\
  '+500' or 'I profited 500'\n\
  '-200' or 'Lost two hundred'";

const OUTCOME_RETRY: &str = "🤔 I didn't quite get that. Try:\n\
  '+500', '-200'\n\
  'I made three hundred'\n\
  'Lost 2 hundred'";

const SENTIMENT_PROMPT: &str = "How did this trade make you feel? 😊/😟/😐\n\
Tell me anything - 'I was nervous', 'Felt like a pro', etc.";

const HELP: &str = "COMMANDS:\n\
/logtrade [link] - Log new trade\n\
/stats - View performance\n\
Talk to me like a human - I'll understand!";

const IDLE_NUDGE: &str = "Let's log some trades! Use /logtrade [TradingView link] \
or ask for help if you're stuck 🤝";

const SAVE_FAILED: &str = "⚠️ I couldn't save that trade, so nothing was recorded.\n\
Please start again with /logtrade when you're ready.";

/// An inbound event after dispatcher extraction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/logtrade <candidate link>`; the argument is raw and unvalidated
    LogTrade { link: Option<String> },
    /// `/stats`
    Stats,
    /// Anything that is not a recognized command
    Text(String),
}

impl Command {
    /// Thin dispatcher: split a leading `/command` from its argument.
    ///
    /// Unknown commands fall through as free text.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let name = parts.next().unwrap_or_default().to_lowercase();
            let arg = parts
                .next()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());

            match name.as_str() {
                "start" => return Command::Start,
                "logtrade" => return Command::LogTrade { link: arg },
                "stats" => return Command::Stats,
                _ => {}
            }
        }
        Command::Text(trimmed.to_string())
    }
}

/// The conversation state machine
pub struct DialogueEngine {
    sessions: Arc<dyn SessionStore>,
    trades: Arc<dyn TradeStore>,
    analyzer: SentimentAnalyzer,

    // Guards against two concurrent deliveries for the same user. Distinct
    // users never contend on these.
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl DialogueEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        trades: Arc<dyn TradeStore>,
        analyzer: SentimentAnalyzer,
    ) -> Self {
        Self {
            sessions,
            trades,
            analyzer,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one inbound message and produce the reply text.
    ///
    /// This is the handler boundary: internal errors are logged for
    /// operators and converted to a user-facing message here.
    pub async fn handle(&self, user_id: &UserId, text: &str) -> String {
        let lock = self.user_lock(user_id).await;
        let _serialized = lock.lock().await;

        match self.dispatch(user_id, Command::parse(text)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(user = %user_id, error = %e, "message handler failed");
                e.user_message()
            }
        }
    }

    async fn dispatch(&self, user_id: &UserId, command: Command) -> Result<String> {
        match command {
            Command::Start => Ok(GREETING.into()),
            Command::LogTrade { link } => self.handle_logtrade(user_id, link),
            Command::Stats => self.handle_stats(user_id).await,
            Command::Text(text) => self.handle_text(user_id, &text).await,
        }
    }

    /// `IDLE -> AWAITING_OUTCOME` on a valid link; a bad link changes nothing.
    fn handle_logtrade(&self, user_id: &UserId, link: Option<String>) -> Result<String> {
        let candidate = link.unwrap_or_default();
        let link = match validate_trade_link(&candidate) {
            Ok(link) => link.to_string(),
            Err(e) => {
                tracing::debug!(user = %user_id, "rejected trade link");
                return Ok(e.user_message());
            }
        };

        let mut session = self.sessions.get_or_create(user_id)?;
        session.begin(link);
        self.sessions.save(&session)?;

        Ok(OUTCOME_PROMPT.into())
    }

    async fn handle_stats(&self, user_id: &UserId) -> Result<String> {
        let metrics = self.trades.compute_metrics(user_id).await?;
        match metrics {
            Some(m) if m.total_trades > 0 => Ok(report::format_stats(&m)),
            _ => Ok(report::NO_TRADES_MESSAGE.into()),
        }
    }

    /// Route free text by the session's current phase.
    async fn handle_text(&self, user_id: &UserId, text: &str) -> Result<String> {
        let mut session = self.sessions.get_or_create(user_id)?;

        match session.phase {
            Phase::Idle => Ok(idle_reply(text)),

            Phase::AwaitingOutcome => match parse_outcome(text) {
                Some(outcome) => {
                    session.record_outcome(outcome);
                    self.sessions.save(&session)?;
                    Ok(SENTIMENT_PROMPT.into())
                }
                // Session unchanged: the link survives the retry.
                None => Ok(OUTCOME_RETRY.into()),
            },

            Phase::AwaitingSentiment => {
                let link = session.pending_link.clone();
                let outcome = session.pending_outcome;
                let (Some(link), Some(outcome)) = (link, outcome) else {
                    // Broken invariant; recover by dropping the cycle.
                    session.reset();
                    self.sessions.save(&session)?;
                    return Err(JournalError::Session(format!(
                        "pending data missing at commit for user {user_id}"
                    )));
                };

                self.commit(user_id, &mut session, link, outcome, text).await
            }
        }
    }

    /// The commit step: classify, assemble, one write attempt, reset.
    ///
    /// At-most-once by design. A failed write tells the user the trade was
    /// not saved and the session still returns to idle; the user re-initiates
    /// with /logtrade rather than the bot retrying on its own.
    async fn commit(
        &self,
        user_id: &UserId,
        session: &mut crate::session::Session,
        link: String,
        outcome: i64,
        notes: &str,
    ) -> Result<String> {
        let analysis = self.analyzer.analyze(notes).await;
        let record = TradeRecord::new(user_id.clone(), link, outcome, analysis.sentiment, notes);

        let write = self.trades.insert_trade(&record).await;

        session.reset();
        self.sessions.save(session)?;

        match write {
            Ok(()) => {
                tracing::info!(
                    user = %user_id,
                    outcome,
                    sentiment = %analysis.sentiment,
                    "trade logged"
                );

                let mut reply = format!(
                    "Logged! Detected: {} sentiment\n\n",
                    analysis.sentiment.as_str().to_uppercase()
                );
                if !analysis.advice.is_empty() {
                    reply.push_str(&format!("💡 Advice: {}", analysis.advice));
                }
                Ok(reply)
            }
            Err(e) => {
                tracing::error!(user = %user_id, error = %e, "trade insert failed");
                Ok(SAVE_FAILED.into())
            }
        }
    }

    async fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn idle_reply(text: &str) -> String {
    let lowered = text.to_lowercase();
    if lowered == "help" || lowered == "how to use" {
        HELP.into()
    } else {
        IDLE_NUDGE.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JournalError;
    use crate::sentiment::{EmotionClassifier, EmotionScore, Sentiment};
    use crate::session::MemorySessionStore;
    use crate::trade::TradeMetrics;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ScriptedClassifier {
        fail: bool,
    }

    #[async_trait]
    impl EmotionClassifier for ScriptedClassifier {
        async fn classify_raw(&self, _text: &str) -> Result<Vec<EmotionScore>> {
            if self.fail {
                return Err(JournalError::ClassifierUnavailable("timeout".into()));
            }
            Ok(vec![
                EmotionScore {
                    label: "joy".into(),
                    score: 0.9,
                },
                EmotionScore {
                    label: "fear".into(),
                    score: 0.1,
                },
            ])
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        inserted: std::sync::Mutex<Vec<TradeRecord>>,
        fail_insert: AtomicBool,
        metrics: std::sync::Mutex<Option<TradeMetrics>>,
    }

    #[async_trait]
    impl TradeStore for RecordingStore {
        async fn insert_trade(&self, record: &TradeRecord) -> Result<()> {
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(JournalError::Storage("insert rejected".into()));
            }
            self.inserted.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn list_user_ids(&self) -> Result<Vec<UserId>> {
            Ok(Vec::new())
        }

        async fn compute_metrics(&self, _user_id: &UserId) -> Result<Option<TradeMetrics>> {
            Ok(self.metrics.lock().unwrap().clone())
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn engine(fail_classifier: bool) -> (DialogueEngine, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        let engine = DialogueEngine::new(
            Arc::new(MemorySessionStore::new()),
            store.clone(),
            SentimentAnalyzer::new(Arc::new(ScriptedClassifier {
                fail: fail_classifier,
            })),
        );
        (engine, store)
    }

    fn phase_of(engine: &DialogueEngine, user: &UserId) -> Phase {
        engine.sessions.get_or_create(user).unwrap().phase
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/stats"), Command::Stats);
        assert_eq!(
            Command::parse("/logtrade https://tradingview.com/chart/a"),
            Command::LogTrade {
                link: Some("https://tradingview.com/chart/a".into())
            }
        );
        assert_eq!(Command::parse("/logtrade"), Command::LogTrade { link: None });
        assert_eq!(
            Command::parse("hello there"),
            Command::Text("hello there".into())
        );
        assert_eq!(
            Command::parse("/unknown thing"),
            Command::Text("/unknown thing".into())
        );
    }

    #[tokio::test]
    async fn test_valid_link_starts_cycle() {
        let (engine, _) = engine(false);
        let user = UserId::from("u1");

        let reply = engine
            .handle(&user, "/logtrade https://tradingview.com/chart/abc")
            .await;
        assert!(reply.contains("What was the outcome"));
        assert_eq!(phase_of(&engine, &user), Phase::AwaitingOutcome);

        let session = engine.sessions.get_or_create(&user).unwrap();
        assert_eq!(
            session.pending_link.as_deref(),
            Some("https://tradingview.com/chart/abc")
        );
    }

    #[tokio::test]
    async fn test_invalid_link_stays_idle() {
        let (engine, _) = engine(false);
        let user = UserId::from("u1");

        let reply = engine.handle(&user, "/logtrade http://example.com/x").await;
        assert!(reply.contains("valid TradingView link"));
        assert_eq!(phase_of(&engine, &user), Phase::Idle);

        let session = engine.sessions.get_or_create(&user).unwrap();
        assert!(session.pending_link.is_none());
    }

    #[tokio::test]
    async fn test_unparsable_outcome_keeps_link() {
        let (engine, _) = engine(false);
        let user = UserId::from("u1");

        engine
            .handle(&user, "/logtrade https://tradingview.com/chart/abc")
            .await;
        let reply = engine.handle(&user, "it went fine I guess").await;

        assert!(reply.contains("didn't quite get that"));
        let session = engine.sessions.get_or_create(&user).unwrap();
        assert_eq!(session.phase, Phase::AwaitingOutcome);
        assert!(session.pending_link.is_some());
    }

    #[tokio::test]
    async fn test_full_cycle_persists_one_record() {
        let (engine, store) = engine(false);
        let user = UserId::from("u1");

        engine
            .handle(&user, "/logtrade https://tradingview.com/chart/abc")
            .await;
        engine.handle(&user, "+300").await;
        let reply = engine.handle(&user, "felt great").await;

        assert!(reply.contains("Logged!"));
        assert!(reply.contains("CONFIDENT"));

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].outcome, 300);
        assert_eq!(inserted[0].sentiment, Sentiment::Confident);
        assert_eq!(inserted[0].notes, "felt great");
        drop(inserted);

        assert_eq!(phase_of(&engine, &user), Phase::Idle);
    }

    #[tokio::test]
    async fn test_classifier_failure_still_commits() {
        let (engine, store) = engine(true);
        let user = UserId::from("u1");

        engine
            .handle(&user, "/logtrade https://tradingview.com/chart/abc")
            .await;
        engine.handle(&user, "lost two hundred").await;
        let reply = engine.handle(&user, "nervous the whole time").await;

        assert!(reply.contains("NEUTRAL"));

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].outcome, -200);
        assert_eq!(inserted[0].sentiment, Sentiment::Neutral);
    }

    #[tokio::test]
    async fn test_persistence_failure_resets_without_retry() {
        let (engine, store) = engine(false);
        let user = UserId::from("u1");

        engine
            .handle(&user, "/logtrade https://tradingview.com/chart/abc")
            .await;
        engine.handle(&user, "-50").await;

        store.fail_insert.store(true, Ordering::SeqCst);
        let reply = engine.handle(&user, "annoyed").await;

        assert!(reply.contains("couldn't save"));
        assert!(store.inserted.lock().unwrap().is_empty());
        assert_eq!(phase_of(&engine, &user), Phase::Idle);

        // A follow-up message is plain idle conversation, no hidden retry.
        store.fail_insert.store(false, Ordering::SeqCst);
        engine.handle(&user, "try again?").await;
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_idle_text_replies() {
        let (engine, _) = engine(false);
        let user = UserId::from("u1");

        let reply = engine.handle(&user, "help").await;
        assert!(reply.contains("COMMANDS"));

        let reply = engine.handle(&user, "good morning").await;
        assert!(reply.contains("/logtrade"));
        assert_eq!(phase_of(&engine, &user), Phase::Idle);
    }

    #[tokio::test]
    async fn test_stats_replies() {
        let (engine, store) = engine(false);
        let user = UserId::from("u1");

        let reply = engine.handle(&user, "/stats").await;
        assert!(reply.contains("No trades logged yet"));

        *store.metrics.lock().unwrap() = Some(TradeMetrics {
            total_trades: 4,
            win_rate: 75.0,
            avg_win: 200.0,
            avg_loss: 80.0,
            risk_reward_ratio: 2.5,
        });

        let reply = engine.handle(&user, "/stats").await;
        assert!(reply.contains("Total Trades: 4"));
        assert!(reply.contains("Win Rate: 75%"));
    }

    #[tokio::test]
    async fn test_relog_overwrites_cycle() {
        let (engine, _) = engine(false);
        let user = UserId::from("u1");

        engine
            .handle(&user, "/logtrade https://tradingview.com/chart/first")
            .await;
        engine.handle(&user, "+10").await;
        engine
            .handle(&user, "/logtrade https://tradingview.com/chart/second")
            .await;

        let session = engine.sessions.get_or_create(&user).unwrap();
        assert_eq!(session.phase, Phase::AwaitingOutcome);
        assert_eq!(
            session.pending_link.as_deref(),
            Some("https://tradingview.com/chart/second")
        );
        assert!(session.pending_outcome.is_none());
    }
}
