//! Mock LLM provider for testing

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use crate::error::{LLMError, Result};
use crate::provider::LLMProvider;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeed with this content
    Text(String),
    /// Fail with this HTTP status
    Status(u16),
}

impl MockReply {
    fn into_result(self, model: &str) -> Result<LLMResponse> {
        match self {
            MockReply::Text(content) => Ok(LLMResponse::new(content, model)
                .with_tokens(10)
                .with_finish_reason("stop")),
            MockReply::Status(status) => Err(LLMError::Status {
                status,
                body: format!("mock failure for {}", model),
            }),
        }
    }
}

/// Mock LLM provider for testing.
///
/// Replies are resolved in order: the next scripted reply queued for the
/// requested model, then the first prompt rule whose needle occurs in the
/// prompt, then the default response. Every request is recorded.
pub struct MockProvider {
    name: String,
    default_response: String,
    per_model: Mutex<HashMap<String, VecDeque<MockReply>>>,
    prompt_rules: Vec<(String, MockReply)>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::with_response("Mock LLM response")
    }

    /// Create with custom default response
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            default_response: response.into(),
            per_model: Mutex::new(HashMap::new()),
            prompt_rules: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue replies for a model, consumed one per call
    pub fn script(self, model: impl Into<String>, replies: Vec<MockReply>) -> Self {
        if let Ok(mut per_model) = self.per_model.lock() {
            per_model.entry(model.into()).or_default().extend(replies);
        }
        self
    }

    /// Reply to every prompt containing `needle`
    pub fn when_prompt_contains(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.prompt_rules.push((needle.into(), reply));
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Models of every request received so far, in call order
    pub fn requested_models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn next_reply(&self, request: &LLMRequest) -> MockReply {
        let scripted = self
            .per_model
            .lock()
            .ok()
            .and_then(|mut per_model| per_model.get_mut(&request.model)?.pop_front());
        if let Some(reply) = scripted {
            return reply;
        }

        self.prompt_rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for MockProvider {
    async fn call(&self, request: LLMRequest) -> Result<LLMResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.next_reply(&request).into_result(&request.model)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LLMProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "Mock"
    }
}
