//! Error Types

use thiserror::Error;

/// Result type alias for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// Journal error types
#[derive(Error, Debug)]
pub enum JournalError {
    /// Emotion classification service error
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Classification service unavailable or not responding
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Persistence store rejected or failed a write/read
    #[error("Storage error: {0}")]
    Storage(String),

    /// Outbound message delivery failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Candidate trade link failed validation
    #[error("Invalid trade link: {0}")]
    InvalidLink(String),

    /// Parse error (e.g., outcome text with no usable number)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// External call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl JournalError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JournalError::ClassifierUnavailable(_)
                | JournalError::Timeout(_)
                | JournalError::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            JournalError::Classifier(_) | JournalError::ClassifierUnavailable(_) => {
                "My sentiment analysis is having a moment 🙃 Let's log it anyway!".into()
            }
            JournalError::Storage(_) => {
                "⚠️ I couldn't reach the trade journal right now. Please try again in a bit.".into()
            }
            JournalError::InvalidLink(_) => {
                "⚠️ Oops! Please share a valid TradingView link.\nExample: /logtrade https://tradingview.com/chart/xyz123".into()
            }
            JournalError::Timeout(_) => {
                "That took longer than expected. Please try again.".into()
            }
            _ => "Something went wrong on my side. Let's try that again.".into(),
        }
    }
}

impl From<anyhow::Error> for JournalError {
    fn from(err: anyhow::Error) -> Self {
        JournalError::Other(err.to_string())
    }
}
