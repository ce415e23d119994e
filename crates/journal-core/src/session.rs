//! Session Management
//!
//! Per-user conversational state tracking which step of trade logging is
//! active. Sessions are created lazily on first interaction, overwritten in
//! place each conversation cycle, and never explicitly destroyed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque stable identifier for a user
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Discrete step within a trade-logging conversation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No conversation in progress
    #[default]
    Idle,
    /// Link captured, waiting for the numeric outcome
    AwaitingOutcome,
    /// Outcome captured, waiting for the emotional reflection
    AwaitingSentiment,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::AwaitingOutcome => write!(f, "awaiting_outcome"),
            Phase::AwaitingSentiment => write!(f, "awaiting_sentiment"),
        }
    }
}

/// Per-user conversational context
///
/// Fields belonging to earlier phases are kept until the session returns to
/// `Idle`, so a commit can read both the link and the outcome together.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Owning user
    pub user_id: UserId,

    /// Current conversation step
    pub phase: Phase,

    /// Trade link captured on entering `AwaitingOutcome`
    pub pending_link: Option<String>,

    /// Signed outcome captured on entering `AwaitingSentiment`
    pub pending_outcome: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh idle session for a user
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            phase: Phase::Idle,
            pending_link: None,
            pending_outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Start a new logging cycle: store the link, await the outcome.
    ///
    /// Overwrites any cycle already in progress.
    pub fn begin(&mut self, link: impl Into<String>) {
        self.pending_link = Some(link.into());
        self.pending_outcome = None;
        self.phase = Phase::AwaitingOutcome;
        self.touch();
    }

    /// Record the parsed outcome, await the reflection.
    pub fn record_outcome(&mut self, outcome: i64) {
        self.pending_outcome = Some(outcome);
        self.phase = Phase::AwaitingSentiment;
        self.touch();
    }

    /// Return to idle, clearing pending data from the finished cycle.
    pub fn reset(&mut self) {
        self.pending_link = None;
        self.pending_outcome = None;
        self.phase = Phase::Idle;
        self.touch();
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }
}

/// Session store trait for persistence
///
/// The in-memory implementation below backs the live bot; a durable keyed
/// store can be swapped in without touching the conversation engine.
pub trait SessionStore: Send + Sync {
    /// Save a session
    fn save(&self, session: &Session) -> crate::Result<()>;

    /// Load a session by user
    fn load(&self, user_id: &UserId) -> crate::Result<Option<Session>>;

    /// Load a session, creating an idle one on first interaction.
    fn get_or_create(&self, user_id: &UserId) -> crate::Result<Session> {
        match self.load(user_id)? {
            Some(session) => Ok(session),
            None => {
                let session = Session::new(user_id.clone());
                self.save(&session)?;
                Ok(session)
            }
        }
    }
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: std::sync::RwLock<std::collections::HashMap<UserId, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> crate::Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, user_id: &UserId) -> crate::Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new(UserId::from("u1"));
        assert!(session.is_idle());
        assert!(session.pending_link.is_none());
        assert!(session.pending_outcome.is_none());
    }

    #[test]
    fn test_cycle_keeps_earlier_fields() {
        let mut session = Session::new(UserId::from("u1"));
        session.begin("https://tradingview.com/chart/abc");
        assert_eq!(session.phase, Phase::AwaitingOutcome);

        session.record_outcome(300);
        assert_eq!(session.phase, Phase::AwaitingSentiment);
        assert_eq!(
            session.pending_link.as_deref(),
            Some("https://tradingview.com/chart/abc")
        );
        assert_eq!(session.pending_outcome, Some(300));

        session.reset();
        assert!(session.is_idle());
        assert!(session.pending_link.is_none());
        assert!(session.pending_outcome.is_none());
    }

    #[test]
    fn test_memory_store_get_or_create() {
        let store = MemorySessionStore::new();
        let user = UserId::from("u1");

        let session = store.get_or_create(&user).unwrap();
        assert!(session.is_idle());

        let mut session = session;
        session.begin("https://tradingview.com/chart/xyz");
        store.save(&session).unwrap();

        let loaded = store.load(&user).unwrap().unwrap();
        assert_eq!(loaded.phase, Phase::AwaitingOutcome);
    }
}
