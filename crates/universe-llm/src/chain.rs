//! Ordered model fallback with per-model retries

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Retry settings applied to each model in a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per model, including the first
    pub max_attempts: u32,
    /// Delay before retry `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Why a model was given up on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFailure {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub reason: String,
}

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("no models configured")]
    NoModels,

    #[error("all {} models failed", .0.len())]
    AllModelsFailed(Vec<ModelFailure>),
}

impl ChainError {
    pub fn failures(&self) -> &[ModelFailure] {
        match self {
            ChainError::NoModels => &[],
            ChainError::AllModelsFailed(failures) => failures,
        }
    }
}

/// Successful chain call
#[derive(Debug, Clone)]
pub struct ChainResponse {
    pub response: LLMResponse,
    /// Model that produced `response`
    pub model_used: String,
    /// Attempts spent on `model_used`
    pub attempts: u32,
}

/// Tries each model in order until one answers.
///
/// Primary models come first, fallbacks after. Each model gets up to
/// `policy.max_attempts` tries; only retryable failures are retried, anything
/// else moves straight on to the next model.
#[derive(Clone)]
pub struct ModelChain {
    client: Arc<dyn LLMClient>,
    models: Vec<String>,
    policy: RetryPolicy,
}

impl ModelChain {
    pub fn new(client: Arc<dyn LLMClient>, primary: Vec<String>, fallback: Vec<String>) -> Self {
        let mut models = primary;
        for model in fallback {
            if !models.contains(&model) {
                models.push(model);
            }
        }
        Self {
            client,
            models,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `request` against the chain; `request.model` is overwritten per attempt.
    pub async fn call(&self, request: &LLMRequest) -> Result<ChainResponse, ChainError> {
        if self.models.is_empty() {
            return Err(ChainError::NoModels);
        }

        let mut failures = Vec::with_capacity(self.models.len());

        for model in &self.models {
            let mut attempt = 0;
            loop {
                attempt += 1;
                debug!(model = %model, attempt, "calling model");

                match self.client.call(request.for_model(model.as_str())).await {
                    Ok(response) if !response.content.trim().is_empty() => {
                        info!(model = %model, attempt, "model answered");
                        return Ok(ChainResponse {
                            response,
                            model_used: model.clone(),
                            attempts: attempt,
                        });
                    }
                    Ok(_) => {
                        warn!(model = %model, "model returned empty content");
                        failures.push(ModelFailure {
                            model: model.clone(),
                            status: None,
                            reason: "empty response".to_string(),
                        });
                        break;
                    }
                    Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                        let delay = self.policy.delay_after(attempt);
                        warn!(
                            model = %model,
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "model call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        warn!(model = %model, attempt, error = %e, "model failed, moving on");
                        failures.push(ModelFailure {
                            model: model.clone(),
                            status: e.status(),
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Err(ChainError::AllModelsFailed(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockProvider, MockReply};

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fallbacks_follow_primaries_without_duplicates() {
        let chain = ModelChain::new(
            Arc::new(MockProvider::new()),
            models(&["a", "b"]),
            models(&["b", "c"]),
        );
        assert_eq!(chain.models(), &["a", "b", "c"]);
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = ModelChain::new(Arc::new(MockProvider::new()), vec![], vec![]);
        let err = chain.call(&LLMRequest::new("p", "")).await.unwrap_err();
        assert!(matches!(err, ChainError::NoModels));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_moves_on_immediately() {
        let mock = Arc::new(
            MockProvider::new()
                .script("a", vec![MockReply::Status(401)])
                .script("b", vec![MockReply::Text("hello".to_string())]),
        );
        let chain = ModelChain::new(mock.clone(), models(&["a"]), models(&["b"]));

        let result = chain.call(&LLMRequest::new("p", "")).await.unwrap();
        assert_eq!(result.model_used, "b");
        assert_eq!(mock.requested_models(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_is_retried_on_same_model() {
        let mock = Arc::new(MockProvider::new().script(
            "a",
            vec![MockReply::Status(429), MockReply::Text("ok".to_string())],
        ));
        let chain = ModelChain::new(mock.clone(), models(&["a"]), vec![]);

        let result = chain.call(&LLMRequest::new("p", "")).await.unwrap();
        assert_eq!(result.model_used, "a");
        assert_eq!(result.attempts, 2);
    }
}
