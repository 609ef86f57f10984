/// LLM Client — the single point of entry for all Gemini API calls in Prospector.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All LLM interactions MUST go through this module.
///
/// Every call walks an ordered model chain: rate-limit failures are retried
/// per model with doubling backoff, then the next model is tried. Any other
/// error aborts immediately so callers can fall back to their deterministic
/// paths without burning the full retry budget.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Ordered fallback chain. Cheapest-adequate model first; each later entry
/// is only reached after the previous one exhausts its rate-limit retries.
pub const MODEL_CHAIN: [&str; 3] = [
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
];

const MAX_ATTEMPTS_PER_MODEL: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Whether this error carries a rate-limit/quota signature.
    /// Only these are retried; everything else aborts the chain.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            LlmError::Api { status, message } => {
                *status == 429
                    || message.contains("RESOURCE_EXHAUSTED")
                    || message.to_lowercase().contains("quota")
                    || message.to_lowercase().contains("rate limit")
            }
            _ => false,
        }
    }
}

/// The text-generation capability injected into the pipeline.
/// `GeminiClient` is the production implementation; tests substitute fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback chain state machine
// ────────────────────────────────────────────────────────────────────────────

/// Next action after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStep {
    /// Retry the same model after sleeping `delay`.
    Retry { model_idx: usize, delay: Duration },
    /// Move to the next model in the chain (no delay).
    NextModel { model_idx: usize },
    /// Every model has used up its retry budget.
    Exhausted,
    /// Non-rate-limit error: stop immediately.
    Abort,
}

/// Tracks (model index, attempt index) across the retry/fallback walk.
/// Kept separate from the HTTP call so the exhaustion behavior is testable
/// without a network.
#[derive(Debug)]
pub struct FallbackChain {
    model_count: usize,
    max_attempts: u32,
    base_backoff: Duration,
    model_idx: usize,
    attempt: u32,
}

impl FallbackChain {
    pub fn new(model_count: usize, max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            model_count,
            max_attempts,
            base_backoff,
            model_idx: 0,
            attempt: 0,
        }
    }

    pub fn current_model(&self) -> usize {
        self.model_idx
    }

    /// Records a failed attempt and returns what to do next.
    pub fn on_failure(&mut self, is_rate_limit: bool) -> ChainStep {
        if !is_rate_limit {
            return ChainStep::Abort;
        }

        self.attempt += 1;
        if self.attempt < self.max_attempts {
            // Backoff doubles per attempt: base, 2*base, ...
            let delay = self.base_backoff * (1u32 << (self.attempt - 1));
            return ChainStep::Retry {
                model_idx: self.model_idx,
                delay,
            };
        }

        self.model_idx += 1;
        self.attempt = 0;
        if self.model_idx < self.model_count {
            ChainStep::NextModel {
                model_idx: self.model_idx,
            }
        } else {
            ChainStep::Exhausted
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by all services in Prospector.
/// Wraps the Gemini generateContent API with the model fallback chain.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    models: Vec<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            models: MODEL_CHAIN.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Generates text, walking the model fallback chain on rate-limit errors.
    /// Returns the most recent error once every model is exhausted.
    pub async fn call(&self, prompt: &str) -> Result<String, LlmError> {
        let mut chain = FallbackChain::new(self.models.len(), MAX_ATTEMPTS_PER_MODEL, BASE_BACKOFF);

        loop {
            let model = &self.models[chain.current_model()];
            let error = match self.call_model(model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            match chain.on_failure(error.is_rate_limit()) {
                ChainStep::Retry { delay, .. } => {
                    warn!(
                        "Model {} rate limited, retrying after {}ms: {}",
                        model,
                        delay.as_millis(),
                        error
                    );
                    tokio::time::sleep(delay).await;
                }
                ChainStep::NextModel { model_idx } => {
                    warn!(
                        "Model {} exhausted its retries, falling back to {}",
                        model, self.models[model_idx]
                    );
                }
                ChainStep::Exhausted => {
                    warn!("All {} models exhausted: {}", self.models.len(), error);
                    return Err(error);
                }
                ChainStep::Abort => return Err(error),
            }
        }
    }

    /// One generateContent call against a single model. No retries here.
    async fn call_model(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{GEMINI_API_BASE}/{model}:generateContent?key={}",
            self.api_key
        );

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self.client.post(&url).json(&request_body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!("LLM call succeeded: model={}, chars={}", model, text.len());
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.call(prompt).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
/// Models wrap JSON in fences despite instructions; always strip defensively.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[{\"url\": \"x\"}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"url\": \"x\"}]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n[{\"url\": \"x\"}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"url\": \"x\"}]");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "[{\"url\": \"x\"}]";
        assert_eq!(strip_json_fences(input), "[{\"url\": \"x\"}]");
    }

    #[test]
    fn test_rate_limit_signature_on_429() {
        let err = LlmError::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_rate_limit_signature_on_quota_message() {
        let err = LlmError::Api {
            status: 403,
            message: "RESOURCE_EXHAUSTED: quota exceeded for model".to_string(),
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_non_rate_limit_error_is_not_retried() {
        let err = LlmError::Api {
            status: 400,
            message: "invalid request".to_string(),
        };
        assert!(!err.is_rate_limit());
        assert!(!LlmError::EmptyContent.is_rate_limit());
    }

    #[test]
    fn test_chain_retries_same_model_with_doubling_backoff() {
        let base = Duration::from_millis(100);
        let mut chain = FallbackChain::new(2, 3, base);

        assert_eq!(
            chain.on_failure(true),
            ChainStep::Retry {
                model_idx: 0,
                delay: base
            }
        );
        assert_eq!(
            chain.on_failure(true),
            ChainStep::Retry {
                model_idx: 0,
                delay: base * 2
            }
        );
    }

    #[test]
    fn test_chain_moves_to_next_model_after_third_failure() {
        let mut chain = FallbackChain::new(2, 3, Duration::from_millis(100));
        chain.on_failure(true);
        chain.on_failure(true);
        assert_eq!(chain.on_failure(true), ChainStep::NextModel { model_idx: 1 });
        assert_eq!(chain.current_model(), 1);
    }

    #[test]
    fn test_chain_exhausts_after_all_models_fail() {
        let model_count = 3;
        let max_attempts = 3;
        let mut chain = FallbackChain::new(model_count, max_attempts, Duration::from_millis(1));

        let mut steps = Vec::new();
        loop {
            let step = chain.on_failure(true);
            let done = step == ChainStep::Exhausted;
            steps.push(step);
            if done {
                break;
            }
        }

        // 3 models x 3 attempts = 9 failures total before exhaustion
        assert_eq!(steps.len() as u32, model_count as u32 * max_attempts);
        assert_eq!(
            steps
                .iter()
                .filter(|s| matches!(s, ChainStep::NextModel { .. }))
                .count(),
            model_count - 1
        );
    }

    #[test]
    fn test_chain_aborts_on_non_rate_limit_error() {
        let mut chain = FallbackChain::new(3, 3, Duration::from_millis(100));
        assert_eq!(chain.on_failure(false), ChainStep::Abort);
        // Still on the first model: abort does not consume the chain
        assert_eq!(chain.current_model(), 0);
    }
}
