//! HuggingFace Emotion Classifier
//!
//! Implementation of `EmotionClassifier` against the HuggingFace
//! text-classification inference API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use journal_core::error::{JournalError, Result};
use journal_core::sentiment::{EmotionClassifier, EmotionScore};

const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/bhadresh-savani/distilbert-base-uncased-emotion";

/// HuggingFace classifier configuration
#[derive(Clone, Debug)]
pub struct HuggingFaceConfig {
    /// Full inference URL for the emotion model
    pub api_url: String,

    /// Bearer token. Optional: anonymous calls are rate-limited but work.
    pub token: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MODEL_URL.into(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl HuggingFaceConfig {
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("HUGGINGFACE_MODEL_URL").unwrap_or_else(|_| DEFAULT_MODEL_URL.into());
        let token = std::env::var("HUGGINGFACE_TOKEN").ok().filter(|t| !t.is_empty());
        let timeout_secs = std::env::var("HUGGINGFACE_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(10);

        Self {
            api_url,
            token,
            timeout_secs,
        }
    }
}

/// The inference API nests scores one level deep per input; some deployments
/// return them flat. Accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<RawScore>>),
    Flat(Vec<RawScore>),
}

#[derive(Debug, Deserialize)]
struct RawScore {
    label: String,
    score: f64,
}

/// HuggingFace emotion classifier
pub struct HuggingFaceClassifier {
    client: reqwest::Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceClassifier {
    pub fn from_config(config: HuggingFaceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(HuggingFaceConfig::from_env())
    }

    /// Whether a bearer token is configured
    pub fn has_token(&self) -> bool {
        self.config.token.is_some()
    }

    fn convert(response: ClassifyResponse) -> Result<Vec<EmotionScore>> {
        let scores = match response {
            ClassifyResponse::Nested(mut nested) => {
                if nested.is_empty() {
                    return Err(JournalError::Classifier("empty classification payload".into()));
                }
                nested.remove(0)
            }
            ClassifyResponse::Flat(flat) => flat,
        };

        Ok(scores
            .into_iter()
            .map(|s| EmotionScore {
                label: s.label,
                score: s.score,
            })
            .collect())
    }
}

#[async_trait]
impl EmotionClassifier for HuggingFaceClassifier {
    async fn classify_raw(&self, text: &str) -> Result<Vec<EmotionScore>> {
        let mut request = self
            .client
            .post(&self.config.api_url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&serde_json::json!({ "inputs": text }));

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                JournalError::Timeout(format!("classification request: {e}"))
            } else {
                JournalError::ClassifierUnavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JournalError::ClassifierUnavailable(format!("HTTP {status}")));
        }

        let payload: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| JournalError::Classifier(format!("malformed payload: {e}")))?;

        Self::convert(payload)
    }

    async fn health_check(&self) -> bool {
        match self.classify_raw("ok").await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("HuggingFace health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HuggingFaceConfig::default();
        assert!(config.api_url.contains("distilbert-base-uncased-emotion"));
        assert_eq!(config.timeout_secs, 10);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_nested_payload() {
        let payload: ClassifyResponse = serde_json::from_str(
            r#"[[{"label": "joy", "score": 0.92}, {"label": "fear", "score": 0.05}]]"#,
        )
        .unwrap();

        let scores = HuggingFaceClassifier::convert(payload).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].label, "joy");
        assert!((scores[0].score - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flat_payload() {
        let payload: ClassifyResponse =
            serde_json::from_str(r#"[{"label": "sadness", "score": 0.7}]"#).unwrap();

        let scores = HuggingFaceClassifier::convert(payload).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, "sadness");
    }

    #[test]
    fn test_empty_nested_payload_is_error() {
        let payload: ClassifyResponse = serde_json::from_str("[]").unwrap();
        assert!(HuggingFaceClassifier::convert(payload).is_err());
    }
}
