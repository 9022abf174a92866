//! Bot generation failures

use crate::chain::ChainError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingApiKey,
    InvalidPrompt,
    PromptTooShort,
    PromptTooLong,
    AllModelsFailed,
    IncompleteBackend,
    IncompleteFrontend,
    InvalidQuestions,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingApiKey => "MISSING_API_KEY",
            ErrorCode::InvalidPrompt => "INVALID_PROMPT",
            ErrorCode::PromptTooShort => "PROMPT_TOO_SHORT",
            ErrorCode::PromptTooLong => "PROMPT_TOO_LONG",
            ErrorCode::AllModelsFailed => "ALL_MODELS_FAILED",
            ErrorCode::IncompleteBackend => "INCOMPLETE_BACKEND",
            ErrorCode::IncompleteFrontend => "INCOMPLETE_FRONTEND",
            ErrorCode::InvalidQuestions => "INVALID_QUESTIONS",
        }
    }

    /// Caused by the request or deployment rather than by a provider
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::MissingApiKey
                | ErrorCode::InvalidPrompt
                | ErrorCode::PromptTooShort
                | ErrorCode::PromptTooLong
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed bot generation
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct BotGenerationError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
}

impl BotGenerationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

impl From<ChainError> for BotGenerationError {
    fn from(err: ChainError) -> Self {
        BotGenerationError::new(ErrorCode::AllModelsFailed, err.to_string())
            .with_details(json!({ "failures": err.failures() }))
    }
}
