//! Universe LLM Integration
//!
//! This crate provides the LLM side of the Chatbot Universe Builder:
//! - Providers: Gemini and OpenRouter over HTTP, plus a scripted mock
//! - Model chains: ordered fallback across models with per-model retries
//! - Generators: clarifying questions, conversational flows and bot source code
//!
//! Question and flow generation degrade to deterministic templates when no
//! provider is configured or a model answer is unusable. Bot generation
//! needs a provider and reports failures with machine-readable codes.

// Re-export core types
pub use client::{LLMClient, LLMRequest, LLMResponse};
pub use error::{LLMError, Result};

// Re-export providers
pub use provider::{
    GeminiProvider, LLMProvider, MockProvider, MockReply, OpenRouterProvider, ProviderRouter,
    DEFAULT_TIMEOUT,
};

pub use chain::{ChainError, ChainResponse, ModelChain, ModelFailure, RetryPolicy};

// Re-export generators
pub use generator::{
    classify, BotGenerationError, BotGenerator, BotGeneratorConfig, BotOutcome, BotRequest,
    BotSummary, CandidateQuestion, ErrorCode, FlowGenerator, FlowQuestion, GeneratedBot,
    GeneratedFlow, GenerationObserver, GenerationStage, GeneratorConfig, ModelsUsed,
    QuestionAnswer, QuestionGenerator,
};

pub mod chain;
pub mod client;
pub mod error;
pub mod generator;
pub mod provider;
