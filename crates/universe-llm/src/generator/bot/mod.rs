//! Standalone chatbot source generation
//!
//! Pipeline:
//! 1. Validate the prompt (no provider is contacted before this passes)
//! 2. Collect follow-up questions, unless the request already carries them
//! 3. Generate backend and frontend code concurrently with the fixed files
//! 4. Assemble the file bundle and a summary
//!
//! Every model call goes through a [`ModelChain`], so provider failures are
//! retried and fall back before they surface as `ALL_MODELS_FAILED`.

mod error;
pub mod templates;

pub use error::{BotGenerationError, ErrorCode};

use crate::chain::ModelChain;
use crate::client::LLMRequest;
use crate::generator::code_cleaner::clean_code;
use crate::generator::json_extractor::extract_as;
use crate::generator::prompt_templates::{
    render, BACKEND_CODE_PROMPT, BOT_QUESTIONS_PROMPT, FRONTEND_CODE_PROMPT, SYSTEM_MESSAGE,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};
use universe_core::BotFiles;

/// Backend code must mention at least one of these
pub const BACKEND_MARKERS: [&str; 4] = ["express", "app.listen", "require(", "router"];
/// Frontend code must mention at least one of these
pub const FRONTEND_MARKERS: [&str; 3] = ["React", "useState", "export default"];

/// A follow-up question and the user's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl QuestionAnswer {
    pub fn new(question: impl Into<String>, answer: Option<String>) -> Self {
        Self {
            question: question.into(),
            answer,
        }
    }
}

/// Input to the bot pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRequest {
    pub prompt: String,
    #[serde(default)]
    pub questions: Option<Vec<QuestionAnswer>>,
    #[serde(default)]
    pub training_text: Option<String>,
    #[serde(default)]
    pub training_link: Option<String>,
}

impl BotRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_questions(mut self, questions: Vec<QuestionAnswer>) -> Self {
        self.questions = Some(questions);
        self
    }

    pub fn with_training_text(mut self, text: impl Into<String>) -> Self {
        self.training_text = Some(text.into());
        self
    }

    pub fn with_training_link(mut self, link: impl Into<String>) -> Self {
        self.training_link = Some(link.into());
        self
    }
}

/// Bot pipeline settings
#[derive(Debug, Clone)]
pub struct BotGeneratorConfig {
    pub min_prompt_chars: usize,
    pub max_prompt_chars: usize,
    /// Cap on generated follow-up questions
    pub max_questions: usize,
    /// Training text beyond this is dropped before prompting
    pub max_training_chars: usize,
    /// Maximum tokens for code responses
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for BotGeneratorConfig {
    fn default() -> Self {
        Self {
            min_prompt_chars: 10,
            max_prompt_chars: 1000,
            max_questions: 6,
            max_training_chars: 10_000,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Pipeline stage, reported to a [`GenerationObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStage {
    Validating,
    Questions,
    Code,
    Assembling,
}

impl GenerationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStage::Validating => "validating",
            GenerationStage::Questions => "questions",
            GenerationStage::Code => "code",
            GenerationStage::Assembling => "assembling",
        }
    }
}

/// Receives stage transitions while a bot is generated
pub trait GenerationObserver: Send + Sync {
    fn stage(&self, stage: GenerationStage);
}

struct NoopObserver;

impl GenerationObserver for NoopObserver {
    fn stage(&self, _stage: GenerationStage) {}
}

/// Which model satisfied each stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsUsed {
    /// Unset when the request supplied its own questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<String>,
    pub backend: String,
    pub frontend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSummary {
    pub models_used: ModelsUsed,
    pub generated_at: DateTime<Utc>,
    pub prompt: String,
    pub questions: Vec<QuestionAnswer>,
    pub file_count: usize,
}

/// A successfully generated bot
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBot {
    pub files: BotFiles,
    pub summary: BotSummary,
}

/// Result of [`BotGenerator::run`].
///
/// Serializes as `{success: true, files, summary}` or
/// `{success: false, error, code, details}`.
#[derive(Debug, Clone)]
pub enum BotOutcome {
    Success(GeneratedBot),
    Failure(BotGenerationError),
}

impl BotOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BotOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<GeneratedBot, BotGenerationError> {
        match self {
            BotOutcome::Success(bot) => Ok(bot),
            BotOutcome::Failure(err) => Err(err),
        }
    }
}

impl Serialize for BotOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        match self {
            BotOutcome::Success(bot) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("files", &bot.files)?;
                map.serialize_entry("summary", &bot.summary)?;
            }
            BotOutcome::Failure(err) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", &err.message)?;
                map.serialize_entry("code", &err.code)?;
                map.serialize_entry("details", &err.details)?;
            }
        }
        map.end()
    }
}

static LIST_MARKER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"^(?:[-*•]+|\d+[.)]|[a-zA-Z][.)])\s*"#).ok());

/// Question strings from a model reply: a JSON array of strings if there is
/// one, otherwise question-looking lines.
pub(crate) fn parse_question_list(content: &str, max: usize) -> Vec<String> {
    if let Ok(list) = extract_as::<Vec<String>>(content, '[') {
        let list: Vec<String> = list
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(max)
            .collect();
        if !list.is_empty() {
            return list;
        }
    }

    content
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = match LIST_MARKER.as_ref() {
                Some(re) => re.replace(line, "").into_owned(),
                None => line.to_string(),
            };
            line.trim().trim_matches('"').trim().to_string()
        })
        .filter(|line| line.contains('?') && line.chars().count() > 10)
        .take(max)
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Chatbot source generator
pub struct BotGenerator {
    chain: Option<ModelChain>,
    config: BotGeneratorConfig,
}

impl BotGenerator {
    /// `chain` is `None` when no provider key is configured
    pub fn new(chain: Option<ModelChain>, config: BotGeneratorConfig) -> Self {
        Self { chain, config }
    }

    pub fn config(&self) -> &BotGeneratorConfig {
        &self.config
    }

    /// Run the pipeline. Failures are reported in the outcome, never returned.
    pub async fn run(&self, request: BotRequest) -> BotOutcome {
        self.run_observed(request, &NoopObserver).await
    }

    pub async fn run_observed(
        &self,
        request: BotRequest,
        observer: &dyn GenerationObserver,
    ) -> BotOutcome {
        match self.try_generate(request, observer).await {
            Ok(bot) => BotOutcome::Success(bot),
            Err(err) => {
                warn!(code = %err.code, error = %err.message, "bot generation failed");
                BotOutcome::Failure(err)
            }
        }
    }

    /// Check the prompt and return it trimmed
    pub fn validate_prompt<'a>(&self, prompt: &'a str) -> Result<&'a str, BotGenerationError> {
        let prompt = prompt.trim();
        let chars = prompt.chars().count();
        if chars == 0 {
            return Err(BotGenerationError::new(
                ErrorCode::InvalidPrompt,
                "Prompt is required",
            ));
        }
        if chars < self.config.min_prompt_chars {
            return Err(BotGenerationError::new(
                ErrorCode::PromptTooShort,
                format!(
                    "Prompt must be at least {} characters",
                    self.config.min_prompt_chars
                ),
            )
            .with_details(json!({ "length": chars, "min": self.config.min_prompt_chars })));
        }
        if chars > self.config.max_prompt_chars {
            return Err(BotGenerationError::new(
                ErrorCode::PromptTooLong,
                format!(
                    "Prompt must be at most {} characters",
                    self.config.max_prompt_chars
                ),
            )
            .with_details(json!({ "length": chars, "max": self.config.max_prompt_chars })));
        }
        Ok(prompt)
    }

    pub async fn try_generate(
        &self,
        request: BotRequest,
        observer: &dyn GenerationObserver,
    ) -> Result<GeneratedBot, BotGenerationError> {
        observer.stage(GenerationStage::Validating);
        let prompt = self.validate_prompt(&request.prompt)?;
        let chain = self.chain.as_ref().ok_or_else(|| {
            BotGenerationError::new(
                ErrorCode::MissingApiKey,
                "No LLM provider API key is configured",
            )
        })?;

        observer.stage(GenerationStage::Questions);
        let supplied = request
            .questions
            .clone()
            .unwrap_or_default()
            .into_iter()
            .filter(|qa| !qa.question.trim().is_empty())
            .collect::<Vec<_>>();
        let (questions, questions_model) = if supplied.is_empty() {
            let (list, model) = self.generate_questions(chain, prompt).await?;
            let list = list
                .into_iter()
                .map(|q| QuestionAnswer::new(q, None))
                .collect();
            (list, Some(model))
        } else {
            (supplied, None)
        };

        let requirements = questions
            .iter()
            .map(|qa| {
                format!(
                    "- {} {}",
                    qa.question,
                    qa.answer.as_deref().unwrap_or("(not answered)")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let training = self.training_section(&request);

        observer.stage(GenerationStage::Code);
        let slug = templates::bot_slug(prompt);
        let values = [
            ("prompt", prompt),
            ("requirements", requirements.as_str()),
            ("training", training.as_str()),
        ];
        let (backend, frontend, (frontend_files, backend_files), config_files) = tokio::try_join!(
            self.backend_code(chain, &values),
            self.frontend_code(chain, &values),
            async {
                Ok::<_, BotGenerationError>((
                    templates::frontend_scaffold(&slug),
                    templates::backend_scaffold(&slug),
                ))
            },
            async { Ok::<_, BotGenerationError>(templates::config_files(&slug, prompt)) },
        )?;

        observer.stage(GenerationStage::Assembling);
        let mut frontend_map: BTreeMap<String, String> = frontend_files;
        frontend_map.insert("src/App.jsx".to_string(), frontend.0);
        let mut backend_map: BTreeMap<String, String> = backend_files;
        backend_map.insert("server.js".to_string(), backend.0);

        let files = BotFiles {
            frontend: frontend_map,
            backend: backend_map,
            config: config_files,
        };

        info!(
            files = files.file_count(),
            backend_model = %backend.1,
            frontend_model = %frontend.1,
            "bot generated"
        );

        let summary = BotSummary {
            models_used: ModelsUsed {
                questions: questions_model,
                backend: backend.1,
                frontend: frontend.1,
            },
            generated_at: Utc::now(),
            prompt: prompt.to_string(),
            questions,
            file_count: files.file_count(),
        };

        Ok(GeneratedBot { files, summary })
    }

    /// Follow-up questions for a prompt and the model that wrote them
    pub async fn generate_questions(
        &self,
        chain: &ModelChain,
        prompt: &str,
    ) -> Result<(Vec<String>, String), BotGenerationError> {
        let request = self.request(render(BOT_QUESTIONS_PROMPT, &[("prompt", prompt)]), 1024);
        let answer = chain.call(&request).await?;

        let questions = parse_question_list(&answer.response.content, self.config.max_questions);
        if questions.is_empty() {
            return Err(BotGenerationError::new(
                ErrorCode::InvalidQuestions,
                "Model reply contained no usable questions",
            )
            .with_details(json!({ "model": answer.model_used })));
        }
        Ok((questions, answer.model_used))
    }

    async fn backend_code(
        &self,
        chain: &ModelChain,
        values: &[(&str, &str)],
    ) -> Result<(String, String), BotGenerationError> {
        let request = self.request(render(BACKEND_CODE_PROMPT, values), self.config.max_tokens);
        let answer = chain.call(&request).await?;
        let code = clean_code(&answer.response.content, &["javascript", "js", "node"]);

        if !BACKEND_MARKERS.iter().any(|m| code.contains(m)) {
            return Err(BotGenerationError::new(
                ErrorCode::IncompleteBackend,
                "Generated backend code does not look like a server",
            )
            .with_details(json!({ "model": answer.model_used, "length": code.len() })));
        }
        Ok((code, answer.model_used))
    }

    async fn frontend_code(
        &self,
        chain: &ModelChain,
        values: &[(&str, &str)],
    ) -> Result<(String, String), BotGenerationError> {
        let request = self.request(render(FRONTEND_CODE_PROMPT, values), self.config.max_tokens);
        let answer = chain.call(&request).await?;
        let code = clean_code(&answer.response.content, &["jsx", "javascript", "js", "tsx"]);

        if !FRONTEND_MARKERS.iter().any(|m| code.contains(m)) {
            return Err(BotGenerationError::new(
                ErrorCode::IncompleteFrontend,
                "Generated frontend code does not look like a React component",
            )
            .with_details(json!({ "model": answer.model_used, "length": code.len() })));
        }
        Ok((code, answer.model_used))
    }

    fn training_section(&self, request: &BotRequest) -> String {
        let mut parts = Vec::new();
        if let Some(text) = request.training_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                parts.push(truncate_chars(text, self.config.max_training_chars).to_string());
            }
        }
        if let Some(link) = request.training_link.as_deref().map(str::trim) {
            if !link.is_empty() {
                parts.push(format!("Reference: {}", link));
            }
        }
        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join("\n\n")
        }
    }

    fn request(&self, prompt: String, max_tokens: u32) -> LLMRequest {
        // The chain fills in the model per attempt
        LLMRequest::new(prompt, "")
            .with_system(SYSTEM_MESSAGE)
            .with_max_tokens(max_tokens)
            .with_temperature(self.config.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_question_list_from_json() {
        let list = parse_question_list(r#"["Who uses it?", "", "What tone?"]"#, 6);
        assert_eq!(list, vec!["Who uses it?", "What tone?"]);
    }

    #[test]
    fn test_question_list_line_heuristic() {
        let reply = "Here are some questions:\n1. Who is your target audience?\n- What tone should it use?\n* Why?\nb) Should it collect emails?\nThanks!";
        let list = parse_question_list(reply, 6);
        assert_eq!(
            list,
            vec![
                "Who is your target audience?",
                "What tone should it use?",
                "Should it collect emails?"
            ]
        );
    }

    #[test]
    fn test_question_list_is_capped() {
        let reply = (1..=10)
            .map(|i| format!("{}. Is this question number {}?", i, i))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_question_list(&reply, 6).len(), 6);
    }

    #[test]
    fn test_prompt_validation() {
        let generator = BotGenerator::new(None, BotGeneratorConfig::default());

        fn hint<F: for<'a> Fn(&'a str) -> Result<&'a str, ErrorCode>>(f: F) -> F {
            f
        }
        let code = hint(|p| generator.validate_prompt(p).map_err(|e| e.code));
        assert_eq!(code("   "), Err(ErrorCode::InvalidPrompt));
        assert_eq!(code("  too short  "), Err(ErrorCode::PromptTooShort));
        assert_eq!(code("short"), Err(ErrorCode::PromptTooShort));
        assert_eq!(code(&"x".repeat(1001)), Err(ErrorCode::PromptTooLong));
        assert_eq!(code("  ten chars! "), Ok("ten chars!"));
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_after_prompt_checks() {
        let generator = BotGenerator::new(None, BotGeneratorConfig::default());

        let short = generator.run(BotRequest::new("hi")).await.into_result().unwrap_err();
        assert_eq!(short.code, ErrorCode::PromptTooShort);

        let valid = generator
            .run(BotRequest::new("A helpful FAQ bot for a bakery"))
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(valid.code, ErrorCode::MissingApiKey);
    }

    #[test]
    fn test_training_text_is_truncated() {
        let generator = BotGenerator::new(
            None,
            BotGeneratorConfig {
                max_training_chars: 5,
                ..Default::default()
            },
        );
        let request = BotRequest::new("p")
            .with_training_text("abcdefghij")
            .with_training_link("https://example.com/menu");

        assert_eq!(
            generator.training_section(&request),
            "abcde\n\nReference: https://example.com/menu"
        );
    }

    struct Recorder(Mutex<Vec<GenerationStage>>);

    impl GenerationObserver for Recorder {
        fn stage(&self, stage: GenerationStage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    #[tokio::test]
    async fn test_observer_sees_every_stage() {
        let mock = Arc::new(
            MockProvider::new()
                .when_prompt_contains(
                    "Write the backend",
                    crate::provider::MockReply::Text("const express = require('express');".into()),
                )
                .when_prompt_contains(
                    "Write the frontend",
                    crate::provider::MockReply::Text("export default function App() {}".into()),
                ),
        );
        let chain = ModelChain::new(mock, vec!["m".into()], vec![]);
        let generator = BotGenerator::new(Some(chain), BotGeneratorConfig::default());
        let recorder = Recorder(Mutex::new(Vec::new()));

        let outcome = generator
            .run_observed(
                BotRequest::new("A helpful FAQ bot for a bakery")
                    .with_questions(vec![QuestionAnswer::new("Tone?", Some("Warm".into()))]),
                &recorder,
            )
            .await;

        assert!(outcome.is_success());
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                GenerationStage::Validating,
                GenerationStage::Questions,
                GenerationStage::Code,
                GenerationStage::Assembling
            ]
        );
    }
}
