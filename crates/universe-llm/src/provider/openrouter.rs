//! OpenRouter provider implementation (OpenAI-compatible chat completions)

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use crate::error::{LLMError, Result};
use crate::provider::{http_client, LLMProvider, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenRouter provider
pub struct OpenRouterProvider {
    api_key: String,
    base_url: String,
    /// Sent as `HTTP-Referer`; OpenRouter uses it for app attribution
    referer: Option<String>,
    /// Sent as `X-Title`
    title: Option<String>,
    client: Client,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            referer: None,
            title: None,
            client: http_client(DEFAULT_TIMEOUT),
        }
    }

    /// Create with custom base URL (self-hosted gateways, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attribution headers
    pub fn with_app_info(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self.title = Some(title.into());
        self
    }

    /// Per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }
}

#[async_trait]
impl LLMClient for OpenRouterProvider {
    async fn call(&self, request: LLMRequest) -> Result<LLMResponse> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({
                "role": "system",
                "content": system
            }));
        }
        messages.push(json!({
            "role": "user",
            "content": request.prompt
        }));

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        debug!(model = %request.model, "calling OpenRouter");

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        let resp = builder.send().await?;

        let status = resp.status();
        let resp_text = resp.text().await?;

        if !status.is_success() {
            return Err(LLMError::Status {
                status: status.as_u16(),
                body: resp_text,
            });
        }

        let resp_json: serde_json::Value = serde_json::from_str(&resp_text)?;

        // OpenRouter reports upstream failures inside a 200 body
        if let Some(message) = resp_json["error"]["message"].as_str() {
            let code = resp_json["error"]["code"].as_u64().unwrap_or(502) as u16;
            return Err(LLMError::Status {
                status: code,
                body: message.to_string(),
            });
        }

        let content = resp_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LLMError::InvalidResponse("No content in response".to_string()))?
            .to_string();

        let finish_reason = resp_json["choices"][0]["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let tokens_used = resp_json["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32;

        Ok(LLMResponse::new(content, request.model)
            .with_tokens(tokens_used)
            .with_finish_reason(finish_reason))
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

impl LLMProvider for OpenRouterProvider {
    fn provider_name(&self) -> &str {
        "OpenRouter"
    }
}
