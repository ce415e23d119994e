//! Application State

use std::sync::Arc;

use journal_core::{DialogueEngine, TradeStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Conversation state machine
    pub engine: Arc<DialogueEngine>,

    /// Trade store, for the health endpoint
    pub trades: Arc<dyn TradeStore>,
}
