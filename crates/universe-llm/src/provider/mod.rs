//! LLM provider implementations

use crate::client::{LLMClient, LLMRequest, LLMResponse};
use crate::error::{LLMError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Outbound request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// LLM provider trait
pub trait LLMProvider: LLMClient {
    /// Get the provider name
    fn provider_name(&self) -> &str;
}

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

mod gemini;
mod mock;
mod openrouter;

pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockReply};
pub use openrouter::OpenRouterProvider;

/// Dispatches each request to the provider that serves its model.
///
/// Model ids starting with `gemini` go to Gemini; everything else is an
/// OpenRouter model slug (`vendor/model`).
#[derive(Clone, Default)]
pub struct ProviderRouter {
    gemini: Option<Arc<dyn LLMClient>>,
    openrouter: Option<Arc<dyn LLMClient>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gemini(mut self, client: Arc<dyn LLMClient>) -> Self {
        self.gemini = Some(client);
        self
    }

    pub fn with_openrouter(mut self, client: Arc<dyn LLMClient>) -> Self {
        self.openrouter = Some(client);
        self
    }

    /// Router over whichever keys are present; `None` when there are none
    pub fn from_keys(
        gemini_api_key: Option<&str>,
        openrouter_api_key: Option<&str>,
        timeout: Duration,
    ) -> Option<Self> {
        let mut router = Self::new();
        if let Some(key) = gemini_api_key.filter(|k| !k.is_empty()) {
            router = router.with_gemini(Arc::new(GeminiProvider::new(key).with_timeout(timeout)));
        }
        if let Some(key) = openrouter_api_key.filter(|k| !k.is_empty()) {
            router = router.with_openrouter(Arc::new(
                OpenRouterProvider::new(key)
                    .with_timeout(timeout)
                    .with_app_info("https://universe.local", "Chatbot Universe Builder"),
            ));
        }
        router.has_any().then_some(router)
    }

    pub fn has_any(&self) -> bool {
        self.gemini.is_some() || self.openrouter.is_some()
    }

    /// Whether a configured provider can take requests for `model`
    pub fn serves(&self, model: &str) -> bool {
        self.route(model).is_some()
    }

    fn route(&self, model: &str) -> Option<&Arc<dyn LLMClient>> {
        if model.starts_with("gemini") {
            self.gemini.as_ref()
        } else {
            self.openrouter.as_ref()
        }
    }
}

#[async_trait]
impl LLMClient for ProviderRouter {
    async fn call(&self, request: LLMRequest) -> Result<LLMResponse> {
        match self.route(&request.model) {
            Some(client) => client.call(request).await,
            None => Err(LLMError::InvalidConfiguration(format!(
                "no provider configured for model '{}'",
                request.model
            ))),
        }
    }

    fn name(&self) -> &str {
        "router"
    }
}
