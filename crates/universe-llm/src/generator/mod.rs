//! Generation from natural language descriptions
//!
//! - Questions: clarifying questions for a chatbot idea
//! - Flows: a conversational node/edge graph from answered questions
//! - Bots: frontend/backend source files for a standalone chatbot
//!
//! The question and flow generators always produce a result: when no client
//! is configured, or the model answer is unusable, they fall back to
//! deterministic templates.
//!
//! # Example - Questions without a provider
//! ```
//! use universe_llm::QuestionGenerator;
//!
//! # async fn example() {
//! let generator = QuestionGenerator::deterministic();
//! let questions = generator
//!     .generate("I need a customer support bot for my restaurant", None)
//!     .await;
//! assert!(questions.len() <= 4);
//! # }
//! ```
//!
//! # Example - Bot generation
//! ```no_run
//! use universe_llm::{BotGenerator, BotGeneratorConfig, BotRequest, ModelChain, ProviderRouter};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let router = ProviderRouter::from_keys(Some("gemini-key"), None, std::time::Duration::from_secs(30));
//! let chain = router.map(|r| {
//!     ModelChain::new(Arc::new(r), vec!["gemini-1.5-flash".to_string()], vec![])
//! });
//! let generator = BotGenerator::new(chain, BotGeneratorConfig::default());
//!
//! let outcome = generator.run(BotRequest::new("A tutoring bot for high school algebra")).await;
//! println!("{}", serde_json::to_string_pretty(&outcome).unwrap());
//! # }
//! ```

pub mod bot;
pub mod code_cleaner;
pub mod flow;
pub mod json_extractor;
pub mod prompt_templates;
pub mod questions;

// Re-export main types
pub use bot::{
    BotGenerationError, BotGenerator, BotGeneratorConfig, BotOutcome, BotRequest, BotSummary,
    ErrorCode, GeneratedBot, GenerationObserver, GenerationStage, ModelsUsed, QuestionAnswer,
};
pub use code_cleaner::{clean_code, fenced_blocks, CodeBlock};
pub use flow::{FlowGenerator, FlowQuestion, GeneratedFlow};
pub use json_extractor::{extract_json_array, extract_json_object};
pub use questions::{classify, CandidateQuestion, QuestionGenerator};

/// Model settings for a single-request generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model to use for generation (e.g., "gemini-1.5-flash")
    pub model: String,
    /// Maximum tokens for response
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 - 1.0, lower = more deterministic)
    pub temperature: Option<f32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            max_tokens: Some(2048),
            temperature: Some(0.4),
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with a specific model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub(crate) fn request(&self, prompt: String) -> crate::client::LLMRequest {
        let mut request = crate::client::LLMRequest::new(prompt, self.model.clone())
            .with_system(prompt_templates::SYSTEM_MESSAGE);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}
