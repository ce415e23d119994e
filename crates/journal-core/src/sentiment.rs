//! Sentiment Classification
//!
//! Maps the raw emotion labels of an external text-classification service
//! into a small trader-facing vocabulary and picks contextual advice.
//!
//! Classification is best-effort: any failure of the external service is
//! absorbed into a neutral result so a trade commit is never blocked on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Trader-facing sentiment vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Confident,
    Uncertain,
    Frustrated,
    Disappointed,
    Surprised,
    Neutral,
    Disgusted,
}

impl Sentiment {
    /// Map a raw emotion label from the classification service.
    ///
    /// Unknown labels land on `Neutral`.
    pub fn from_emotion_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "joy" => Sentiment::Confident,
            "fear" => Sentiment::Uncertain,
            "anger" => Sentiment::Frustrated,
            "sadness" => Sentiment::Disappointed,
            "surprise" => Sentiment::Surprised,
            "neutral" => Sentiment::Neutral,
            "disgust" => Sentiment::Disgusted,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Confident => "confident",
            Sentiment::Uncertain => "uncertain",
            Sentiment::Frustrated => "frustrated",
            Sentiment::Disappointed => "disappointed",
            Sentiment::Surprised => "surprised",
            Sentiment::Neutral => "neutral",
            Sentiment::Disgusted => "disgusted",
        }
    }

    /// Canned coaching line for this sentiment, if one is defined.
    fn advice(&self) -> Option<&'static str> {
        match self {
            Sentiment::Confident => Some(
                "🚀 Confidence is key! Remember to always protect profits with a trailing stop.",
            ),
            Sentiment::Frustrated => Some(
                "🔥 Frustration is normal. Take a break and revisit your strategy with fresh eyes.",
            ),
            Sentiment::Disappointed => {
                Some("😞 Don't let this shake your confidence. Every trader has off days.")
            }
            Sentiment::Uncertain => {
                Some("🤔 Uncertainty means you need clearer rules. Review your trading plan.")
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single `(label, confidence)` pair from the classification service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f64,
}

/// Strategy trait for emotion classification backends
///
/// Implement this for each provider: HuggingFace inference, a local model,
/// a test double, etc. The conversation core works exclusively through
/// this interface.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify raw text into scored emotion labels.
    async fn classify_raw(&self, text: &str) -> Result<Vec<EmotionScore>>;

    /// Check if the classifier is reachable and configured correctly.
    async fn health_check(&self) -> bool {
        true
    }

    /// Classifier name, for logs
    fn name(&self) -> &str;
}

/// Classifier output after mapping into the trader vocabulary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SentimentReport {
    pub sentiment: Sentiment,
    pub advice: String,
}

const STOP_LOSS_ADVICE: &str =
    "🛑 You mentioned stop-loss - did you stick to your plan? Adjust if needed!";
const OVERLEVERAGED_ADVICE: &str = "⚠️ Overleveraged? Reduce position size to stay calm.";
const FALLBACK_ADVICE: &str = "My sentiment analysis is having a moment 🙃 Let's log it anyway!";

/// Best-effort sentiment analysis over an [`EmotionClassifier`]
pub struct SentimentAnalyzer {
    classifier: std::sync::Arc<dyn EmotionClassifier>,
}

impl SentimentAnalyzer {
    pub fn new(classifier: std::sync::Arc<dyn EmotionClassifier>) -> Self {
        Self { classifier }
    }

    /// Analyze reflection text. Never fails: classifier errors degrade to
    /// `Neutral` with a fixed fallback message.
    pub async fn analyze(&self, text: &str) -> SentimentReport {
        match self.classifier.classify_raw(text).await {
            Ok(scores) => {
                let sentiment = top_sentiment(&scores);
                SentimentReport {
                    sentiment,
                    advice: select_advice(text, sentiment),
                }
            }
            Err(e) => {
                tracing::warn!(classifier = self.classifier.name(), error = %e, "sentiment classification failed, falling back to neutral");
                SentimentReport {
                    sentiment: Sentiment::Neutral,
                    advice: FALLBACK_ADVICE.into(),
                }
            }
        }
    }
}

/// Pick the highest-scored label, mapped into the trader vocabulary.
///
/// Ties keep the first label in response order, so identical inputs always
/// classify identically. An empty score list counts as malformed and lands
/// on `Neutral`.
fn top_sentiment(scores: &[EmotionScore]) -> Sentiment {
    let mut best: Option<&EmotionScore> = None;
    for score in scores {
        if best.is_none_or(|b| score.score > b.score) {
            best = Some(score);
        }
    }
    best.map_or(Sentiment::Neutral, |s| {
        Sentiment::from_emotion_label(&s.label)
    })
}

/// Advice precedence: stop-loss mention, then leverage mention, then the
/// per-sentiment table, then nothing.
fn select_advice(text: &str, sentiment: Sentiment) -> String {
    let lowered = text.to_lowercase();
    if lowered.contains("stop-loss") {
        STOP_LOSS_ADVICE.into()
    } else if lowered.contains("overleveraged") {
        OVERLEVERAGED_ADVICE.into()
    } else {
        sentiment.advice().unwrap_or_default().into()
    }
}
